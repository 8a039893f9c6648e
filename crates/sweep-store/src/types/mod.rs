mod marker;
mod object_id;

pub use marker::Marker;
pub use object_id::{ListedObject, ObjectId};
