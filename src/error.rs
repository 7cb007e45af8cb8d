use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),

    #[error("id {id} is not assigned in the vocabulary")]
    UnassignedId { id: u32 },

    #[error("supplied token mapping has no <unk> entry")]
    MissingUnknown,

    #[error("token mapping id {id} is out of range for a dense vocabulary")]
    SparseMapping { id: u32 },

    #[error("token mapping assigns id {id} more than once")]
    DuplicateId { id: u32 },
}
