use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not found")]
    NotFound,

    #[error("unknown order status '{0}'")]
    UnknownOrderStatus(String),

    #[error("database error")]
    Sqlx(#[from] sqlx::Error),

    #[error("orm error")]
    Orm(#[from] sea_orm::DbErr),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
