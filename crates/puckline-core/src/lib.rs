// Library root: the pure projection model. Everything here is synchronous
// and free of I/O; loading, configuration and reporting live in puckline-app.

pub mod corrections;
pub mod directory;
pub mod lineup;
pub mod matrix;
pub mod odds;
pub mod slate;
pub mod team;
pub mod value;
pub mod weighting;
