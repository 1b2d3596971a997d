// 駆動する側アダプター（HTTP境界）

pub mod extractor;
pub mod request_dto;
pub mod response_dto;
pub mod rest_api;
pub mod validation;
