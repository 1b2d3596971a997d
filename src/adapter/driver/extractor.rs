use crate::adapter::driver::rest_api::{map_application_error, ApiError, AppState, Severity};
use crate::application::ApplicationError;
use crate::domain::model::{Actor, MemberId};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::StatusCode, Json};

/// 操作者を識別するヘッダー
pub const ACTOR_HEADER: &str = "x-actor-id";

/// 認証済みの操作者
/// ハンドラーの引数に追加すると、ヘッダーの会員IDから操作者を解決する
pub struct AuthenticatedActor(pub Actor);

fn unauthenticated(message: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::new(message, "UNAUTHENTICATED", Severity::Error)),
    )
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedActor {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthenticated("Authentication required"))?;

        let member_id = MemberId::from_string(header.trim())
            .map_err(|_| unauthenticated("Invalid actor id"))?;

        // 存在しない会員は未認証として扱う
        match state.member_query_service.find_member(member_id).await {
            Ok(member) => Ok(Self(member.as_actor())),
            Err(ApplicationError::NotFound(_)) => Err(unauthenticated("Unknown actor")),
            Err(err) => Err(map_application_error(err, Severity::Error)),
        }
    }
}
