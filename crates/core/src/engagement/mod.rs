mod analyze_engagement;

pub use analyze_engagement::*;
