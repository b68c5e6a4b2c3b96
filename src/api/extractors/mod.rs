/*!
 * Request extractors shared by the capability routes
 *
 * Public API:
 * - CapabilityParams (path + query + JSON body merged)
 * - MaybeIdentity (VerifiedIdentity left by the bearer gate, if any)
 */

mod identity;
mod params;

pub use identity::MaybeIdentity;
pub use params::CapabilityParams;
