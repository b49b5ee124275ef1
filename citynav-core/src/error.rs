use thiserror::Error;

use crate::model::streets::Compass;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no route between the requested points")]
    Unreachable,
    #[error("no street leaves the current corner heading {0}")]
    InvalidDirection(Compass),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
