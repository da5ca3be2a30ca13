//! Apply `dbedit` CSV changesets to PAN-OS firewall and Panorama configurations.
//!
//! A changeset is a positional CSV where each row asks for one create, delete,
//! edit or group-membership change. The library turns rows into typed
//! operations, checks that every create's references resolve in the target
//! scope, and applies the operations in dependency order under the device's
//! config and commit locks.
//!
//! # Architecture
//!
//! ## Input
//!
//! - [`row`]: Positional columns and per-row normalization
//! - [`syntax`]: Per-kind field checks
//! - [`builder`]: Row to [`change::ChangeOperation`]
//! - [`changeset`]: Reading the CSV and indexing operations
//!
//! ## Model
//!
//! - [`kind`]: Object kinds, rulebases, actions and namespaces
//! - [`objects`]: Typed configuration records
//! - [`field`] / [`schema`]: Untyped field maps and the per-kind field table
//! - [`scope`]: Shared, device-group, vsys and virtual-router scopes
//!
//! ## Device
//!
//! - [`device`]: The [`device::DeviceClient`] seam and the XML-file device
//! - [`tree`]: Cached view of the device used during a run
//!
//! ## Reconciliation
//!
//! - [`resolver`] / [`validator`]: Reference snapshots and create checks
//! - [`groups`]: Member add/remove with placeholder handling
//! - [`applier`]: Ordered per-scope passes
//! - [`coordinator`]: Locks, commit and revert
//! - [`ledger`]: Per-operation outcomes
//! - [`run`]: Scope selection and the whole run
//! - [`export`]: Live objects back out as a changeset
//!
//! ## Ambient
//!
//! - [`settings`], [`predefined`], [`logging`], [`report`], [`error`]

pub mod applier;
pub mod builder;
pub mod change;
pub mod changeset;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod export;
pub mod field;
pub mod groups;
pub mod kind;
pub mod ledger;
pub mod logging;
pub mod objects;
pub mod predefined;
pub mod report;
pub mod resolver;
pub mod row;
pub mod run;
pub mod schema;
pub mod scope;
pub mod settings;
pub mod syntax;
pub mod tree;
pub mod validator;

#[cfg(test)]
mod testing;
