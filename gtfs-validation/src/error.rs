//! Module for the error management
//!
//! Errors never leave the engine: [crate::Validator] turns every one of them into a
//! [crate::Notice] at the nearest orchestration boundary.
use thiserror::Error;

/// An error that can occur when reading a feed or exporting its validation report.
#[derive(Error, Debug)]
pub enum Error {
    /// A mandatory file is not present in the archive
    #[error("Could not find file {0}")]
    MissingFile(String),
    /// The given path to the GTFS is neither a file nor a directory
    #[error("Could not read GTFS: {0} is neither a file nor a directory")]
    NotFileNorDirectory(String),
    /// The time is not given in the HH:MM:SS format
    #[error("'{0}' is not a valid time; HH:MM:SS format is expected.")]
    InvalidTime(String),
    /// The color is not given in the RRGGBB format, without a leading `#`
    #[error("'{0}' is not a valid color; RRGGBB format is expected, without a leading `#`")]
    InvalidColor(String),
    /// Generic Input/Output error while reading a file
    #[error("impossible to read file")]
    IO(#[from] std::io::Error),
    /// Impossible to read a file
    #[error("impossible to read '{file_name}'")]
    NamedFileIO {
        /// The file name that could not be read
        file_name: String,
        /// The inital error that caused the unability to read the file
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Impossible to fetch the remote archive by the URL
    #[cfg(feature = "read-url")]
    #[error("impossible to remotely access file")]
    Fetch(#[from] reqwest::Error),
    /// Impossible to read a CSV file
    #[error("impossible to read csv file '{file_name}'")]
    CSVError {
        /// File name that could not be parsed as CSV
        file_name: String,
        /// The initial error by the csv library
        #[source]
        source: csv::Error,
        /// The line of the file where the csv library gave up, when known
        line: Option<u64>,
    },
    /// Error when trying to unzip the GTFS archive
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// The JSON report or the JSON execution parameters could not be handled
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A protobuf problem could not be encoded
    #[error(transparent)]
    ProtobufEncode(#[from] prost::EncodeError),
    /// The execution parameter is not one the validator knows about
    #[error("execution parameter '{0}' is not handled")]
    UnknownExecParam(String),
    /// The execution parameter has no value and no default
    #[error("execution parameter '{0}' has no value")]
    MissingExecParamValue(String),
    /// The execution parameter value cannot be interpreted
    #[error("execution parameter '{key}' has an invalid value '{value}'")]
    InvalidExecParam {
        /// Key of the parameter
        key: String,
        /// The value that could not be interpreted
        value: String,
    },
}
