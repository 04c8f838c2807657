pub(crate) mod announcements;
pub(crate) mod attempts;
pub(crate) mod questions;
pub(crate) mod quizzes;
pub(crate) mod responses;
pub(crate) mod users;
