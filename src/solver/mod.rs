mod resolver;

pub use resolver::{ContactResolver, ResolverConfig};
