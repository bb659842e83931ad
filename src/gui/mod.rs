pub mod frontend;
pub mod node_view;
