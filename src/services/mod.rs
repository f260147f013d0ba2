pub mod media_service;
pub mod path_resolver;
pub mod storage;
