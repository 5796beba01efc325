use std::borrow::Cow;

use thiserror::Error;

pub mod ingress;
pub mod intent;
pub mod labels;
pub mod service;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceGenerationError {
    #[error("Resource contains invalid data ({})!", .0)]
    InvalidData(Cow<'static, str>),
    #[error("Provided dependent resource is missing a name!")]
    DependentMissingMetadataName,
    #[error("Provided dependent resource is missing a namespace!")]
    DependentMissingMetadataNamespace,
    #[error("Provided dependent resource is missing required data ({})!", .0)]
    DependentMissingData(Cow<'static, str>),
}
