//! # TroGiang Classroom
//!
//! Classes, their students and their topics. A class is a JSON file on
//! disk; each topic points at a knowledge base by its storage key.
//!
//! ```text
//! data/
//! ├── classes/
//! │   └── 10A1_info.json   # {class_code, students, topics: [{name, file}]}
//! └── knowledge.db         # chunks + embeddings per (class, topic)
//! ```

pub mod classroom;
pub mod registry;

pub use classroom::Classroom;
pub use registry::{ClassInfo, ClassRegistry, TopicEntry};
