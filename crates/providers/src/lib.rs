//! Model selection and model invocation for Amplifai.
//!
//! [`ModelEnsemble`] decides *which* model answers; the invokers in this
//! crate implement `amplifai_core::ModelInvoker` and decide *how* it is
//! reached. The builders wire both from configuration.

pub mod builder;
pub mod echo;
pub mod ensemble;
pub mod fallback;
pub mod openai_compat;
pub mod selection;

pub use builder::{build_ensemble, build_invoker};
pub use echo::EchoInvoker;
pub use ensemble::{DuplicatePolicy, ModelDescriptor, ModelEnsemble};
pub use fallback::FallbackInvoker;
pub use openai_compat::OpenAiCompatInvoker;
pub use selection::{CapabilityMatch, FirstRegistered, FnPolicy, SelectionPolicy, policy_from_name};
