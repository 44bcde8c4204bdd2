mod repair;

pub use repair::{boundary_from_content_type, infer_boundary, repair};
