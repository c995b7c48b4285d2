pub(crate) mod catalog;
pub(crate) mod exam_session;
pub(crate) mod notifications;
pub(crate) mod progress;
pub(crate) mod routing;
pub(crate) mod scoring;
pub(crate) mod submission;
