pub(crate) mod catalog;
pub(crate) mod exam_settings;
pub(crate) mod responses;
pub(crate) mod results;
pub(crate) mod users;
