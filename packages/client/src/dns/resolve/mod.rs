//! Hostname resolution.
//!
//! The [`Resolve`] trait is the seam between the negotiators and DNS. Every
//! implementation picks one address deterministically with
//! [`select_address`], so the same lookup result always yields the same
//! connection target.

mod gai;
mod hickory;
mod lookup;
mod overrides;
mod traits;
mod types;
mod utilities;

pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use lookup::TokioResolver;
pub use overrides::StaticResolver;
pub use traits::{BlockingResolve, Resolve};
pub use types::{AddressFamily, ResolveError, ResolvedAddress};
pub use utilities::{select_address, sort_by_family, validate_hostname};
