#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use parallax_image as image;

#[doc(inline)]
pub use parallax_features as features;

#[doc(inline)]
pub use parallax_pose as pose;

#[doc(inline)]
pub use parallax_viz as viz;

/// The two-view odometry pipeline composing the stages.
pub mod odometry;
