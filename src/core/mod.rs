// Core building blocks shared by the engine and the HTTP layer

pub mod errors;
pub mod params;
pub mod time;
