//! AWS side of llmdeploy.
//!
//! Two independent workflows live here:
//!
//! - **Credential provisioning**: [`create_sagemaker_user`] creates an IAM
//!   user, attaches a versioned [`PolicySet`] and mints an access key that
//!   [`write_credentials`] persists as JSON.
//! - **Endpoint deployment**: [`create_endpoint`] validates settings, opens a
//!   hosting session, resolves the TGI serving image and hands a
//!   [`DeploymentRequest`] to [`SagemakerHuggingfaceStrategy`].
//!
//! Both talk to AWS through traits ([`IdentityApi`], [`HostingConnector`])
//! with in-memory mocks for tests.

#![forbid(unsafe_code)]

pub mod credentials;
pub mod deployer;
pub mod error;
pub mod hosting;
pub mod identity;
pub mod image;
pub mod policy;
pub mod provisioner;
pub mod resources;
pub mod service;
pub mod state;
pub mod strategy;
pub mod types;

pub use credentials::{
    read_credentials, write_credentials, CredentialRecord, DEFAULT_CREDENTIALS_FILE,
};
pub use deployer::{create_endpoint, EndpointRequest};
pub use error::{CloudError, CloudResult};
pub use hosting::{connector, EndpointStatus, HostingConnector, HostingSession};
pub use identity::{IamIdentity, IdentityApi};
pub use image::{huggingface_llm_image_uri, ImageQuery};
pub use policy::{PolicySet, SAGEMAKER_DEPLOYER_POLICIES};
pub use provisioner::{create_sagemaker_user, OnFailure, DEFAULT_USERNAME};
pub use resources::{DeployTimings, ResourceManager};
pub use service::{DeployedResources, DeploymentRequest, DeploymentService};
pub use state::{DeployRequested, Endpoint, EndpointState, NotDeployed};
pub use strategy::{EndpointType, SagemakerHuggingfaceStrategy};
pub use types::{DeployConfig, ResourceConfig};
