//! Data model for the policy interchange bundle.
//!
//! The conversion front-end emits a single JSON file holding every object
//! to import: a flat array of `TypeName`-tagged records. This crate parses
//! that file into typed records and buckets them by kind so the import
//! pipeline can process them in dependency order.

pub mod bundle;
pub mod objects;

pub use bundle::{BundleError, GroupEntry, PolicyBundle};
pub use objects::{
    AccessRule, Domain, GroupWithExclusion, Host, IcmpService, NatRule, Network, NetworkGroup,
    ObjectRef, OtherService, Package, ParentLayer, PortService, Range, ServiceGroup, SimpleGateway,
    SourceObject, SubLayer, Time, TimeGroup, Zone,
};
