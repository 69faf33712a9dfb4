//! # Ellipso Materials
//!
//! Optical-constant providers for the Ellipso thin-film simulator. Every
//! material implements the [`MaterialProvider`](provider::MaterialProvider)
//! trait, which yields the complex dielectric function $\epsilon(\lambda)$ and
//! refractive index $\tilde{n}(\lambda) = n + ik$ at a wavelength in nm.
//!
//! ## Material variants
//!
//! | Variant | Module | Source of $\tilde{n}(\lambda)$ |
//! |---------|--------|------------------------------|
//! | Constant | [`material`] | Fixed complex index (air, ideal dielectrics) |
//! | Tabulated | [`tabulated`] | $(\lambda, n, k)$ table, linear or spline |
//! | Oscillator | [`lorentz`] | $\epsilon_\infty$ + Lorentz oscillators |
//! | Doped | [`lorentz`] | Host material + Lorentz oscillators |
//! | Maxwell Garnett | [`effective_medium`] | Inclusions at volume fraction $f$ in a host |
//!
//! [`material::Material`] is the tagged enum over all of them; stacks hold
//! `Arc<Material>` so layers can share one definition.
//!
//! ## Data files
//!
//! Tabulated constants are read from `.nk` text files by [`nk`]. A small set
//! of built-in materials lives in [`library`].
//!
//! ## Sign convention
//!
//! Absorbing media have $k > 0$ and $\epsilon_2 > 0$, i.e. fields vary as
//! $\exp(i(kz - \omega t))$.

pub mod effective_medium;
pub mod library;
pub mod lorentz;
pub mod material;
pub mod nk;
pub mod provider;
pub mod spline;
pub mod tabulated;

pub use material::Material;
pub use provider::{MaterialError, MaterialProvider};
