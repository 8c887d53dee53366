/*! Ingestion and validation engine for [General Transit Feed Specification](https://gtfs.org/) (GTFS) feeds.

A GTFS feed is a collection of CSV files (often bundled as a zip file).
Each file represents a collection of one type (stops, lines, etc.) that have relationships through unique identifiers.

This crate reads a feed, checks every row against the reference, keeps the valid objects in a
[DatasetRepository] and runs a set of validation rules on them. Everything that is found is a
[Notice], collected in a [NoticeRepository] and exported as JSON or protobuf.

To get started, see [Validator].

## Design decisions

### Two stages

The [RawGtfs] representation holds the tables as close as possible to their CSV representation.
The ingestion parses each row with a [RowParser], builds the domain object with an
[EntityBuilder] and stores it. A row with an error never reaches the dataset, so the rules only
ever see valid objects.

The rules then query the [DatasetRepository], which is read-only once the ingestion is over.

### Use of Enum

Many values are integers that are actually enumerations of certain values. We always use Rust enums, like [LocationType] to represent them, and not the integer value.

The notices are a closed enum too, [NoticeKind]. The exporters match on it exhaustively.

### Reference

We try to stick as closely as possible to the reference. Optional fields are [std::option], while missing mandatory elements will result in a notice.
If a default value is defined, we will use it.

There are two references <https://gtfs.org/reference/static> and <https://developers.google.com/transit/gtfs/reference>. They are mostly the same, even if google’s specification has some extensions.

### Renaming

We kept some names even if they can be confusing (a [Calendar] will be referenced by `service_id`), but we strip the object type (`route_short_name` is [Route::short_name]).

*/
#![warn(missing_docs)]

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate serde_derive;

pub mod builders;
mod enums;
pub mod error;
pub mod exec_params;
pub mod export;
pub mod geo;
mod gtfs_reader;
pub mod ingest;
mod notice;
mod notice_repository;
pub(crate) mod objects;
pub mod parser;
mod raw_gtfs;
pub mod repository;
pub mod rules;
pub mod schema;
pub mod time;
mod validator;
mod value_helpers;

#[cfg(test)]
mod tests;

pub use builders::{EntityBuildResult, EntityBuilder};
pub use error::Error;
pub use exec_params::ExecParamRepository;
pub use export::{ExportFormat, NoticeExporter};
pub use gtfs_reader::GtfsReader;
pub use notice::{Notice, NoticeKind, NoticeValue, Severity, NO_ID};
pub use notice_repository::NoticeRepository;
pub use objects::*;
pub use parser::{FieldValue, ParsedEntity, RowParser};
pub use raw_gtfs::{RawEntity, RawGtfs, RawTable, RowProvider};
pub use repository::DatasetRepository;
pub use validator::Validator;
