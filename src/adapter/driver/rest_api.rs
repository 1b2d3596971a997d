use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::extractor::AuthenticatedActor;
use crate::adapter::driver::request_dto::{
    BookRequest, BooksQueryParams, BorrowingsQueryParams, ChangePasswordRequest,
    CreateBorrowingRequest, RegisterMemberRequest, RemindersQueryParams,
};
use crate::adapter::driver::response_dto::{
    BookResponse, BorrowingHistoryResponse, BorrowingResponse, MemberResponse,
    MemberSummaryResponse,
};
use crate::adapter::driver::validation::{
    self, ValidationErrors, BOOK_RULES, BORROWING_RULES, PASSWORD_RULES, REGISTER_RULES,
};
use crate::application::service::{
    BookApplicationService, BookQueryService, BorrowingApplicationService, BorrowingFilter,
    BorrowingQueryService, MemberApplicationService, MemberQueryService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    BookDetails, BookId, BorrowingId, CoverImageUrl, Email, Isbn, MemberId,
};
use crate::domain::port::{
    BookRepository, BorrowingRepository, Clock, LibraryStore, Logger, MemberRepository,
    PasswordHasher,
};
use crate::domain::reminder::{DEFAULT_DUE_SOON_WINDOW_DAYS, MAX_DUE_SOON_WINDOW_DAYS};

/// エラーの重要度（表示用）
/// クイック貸出の失敗は警告、それ以外はエラーとして扱う
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    pub severity: Severity,
    /// フィールドごとの検証エラー
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl ApiError {
    pub fn new(error: &str, code: &str, severity: Severity) -> Self {
        Self {
            error: error.to_string(),
            code: code.to_string(),
            severity,
            fields: None,
        }
    }
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub book_service: Arc<BookApplicationService>,
    pub member_service: Arc<MemberApplicationService>,
    pub borrowing_service: Arc<BorrowingApplicationService>,
    pub book_query_service: Arc<BookQueryService>,
    pub member_query_service: Arc<MemberQueryService>,
    pub borrowing_query_service: Arc<BorrowingQueryService>,
}

impl AppState {
    /// ストア・リポジトリ・時計などからサービス一式を組み立てる
    pub fn new(
        store: Arc<dyn LibraryStore>,
        book_repository: Arc<dyn BookRepository>,
        member_repository: Arc<dyn MemberRepository>,
        borrowing_repository: Arc<dyn BorrowingRepository>,
        clock: Arc<dyn Clock>,
        password_hasher: Arc<dyn PasswordHasher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            book_service: Arc::new(BookApplicationService::new(store.clone(), logger.clone())),
            member_service: Arc::new(MemberApplicationService::new(
                store.clone(),
                password_hasher,
                logger.clone(),
            )),
            borrowing_service: Arc::new(BorrowingApplicationService::new(
                store,
                clock.clone(),
                logger,
            )),
            book_query_service: Arc::new(BookQueryService::new(book_repository)),
            member_query_service: Arc::new(MemberQueryService::new(
                member_repository,
                borrowing_repository.clone(),
            )),
            borrowing_query_service: Arc::new(BorrowingQueryService::new(
                borrowing_repository,
                clock,
            )),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/members", post(register_member).get(list_members))
        .route("/members/:id", get(get_member))
        .route("/members/:id/toggle-permission", put(toggle_permission))
        .route("/members/:id/password", put(change_password))
        .route("/members/:id/borrowings", get(member_borrowings))
        .route("/members/:id/reminders", get(member_reminders))
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books/:id/borrow", post(quick_borrow))
        .route("/borrowings", get(list_borrowings).post(create_borrowing))
        .route("/borrowings/overdue", get(overdue_borrowings))
        .route("/borrowings/:id", get(get_borrowing))
        .route("/borrowings/:id/return", put(return_borrowing))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "library-catalog",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn error_response(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    map_application_error(err, Severity::Error)
}

fn invalid_parameter(message: String) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(&message, "INVALID_PARAMETER", Severity::Error)),
    )
}

fn validation_failed(errors: ValidationErrors) -> (StatusCode, Json<ApiError>) {
    let mut api_error = ApiError::new(
        "The given data was invalid.",
        "VALIDATION_FAILED",
        Severity::Error,
    );
    api_error.fields = Some(errors);
    (StatusCode::UNPROCESSABLE_ENTITY, Json(api_error))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|_| invalid_parameter("無効なクエリパラメータです".to_string()))
}

// 会員登録エンドポイント（認証不要）
async fn register_member(
    State(state): State<AppState>,
    Json(request): Json<RegisterMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberResponse>)> {
    validation::validate(&request, REGISTER_RULES).map_err(validation_failed)?;

    let email = Email::new(request.email.unwrap_or_default())
        .map_err(|e| error_response(e.into()))?;
    let password = request.password.unwrap_or_default();

    let member = state
        .member_service
        .register_member(request.name.unwrap_or_default(), email, &password)
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(MemberResponse::from_member(&member)),
    ))
}

// 会員一覧エンドポイント（管理者）
async fn list_members(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> ApiResult<Json<Vec<MemberSummaryResponse>>> {
    let summaries = state
        .member_query_service
        .list_members_with_counts(&actor)
        .await
        .map_err(error_response)?;
    Ok(Json(
        summaries
            .iter()
            .map(MemberSummaryResponse::from_summary)
            .collect(),
    ))
}

// 会員詳細エンドポイント（管理者または本人）
async fn get_member(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Json<MemberResponse>> {
    let member = state
        .member_query_service
        .get_member(&actor, MemberId::from_uuid(member_id))
        .await
        .map_err(error_response)?;
    Ok(Json(MemberResponse::from_member(&member)))
}

// 貸出許可の切り替えエンドポイント（管理者）
async fn toggle_permission(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Json<MemberResponse>> {
    let member = state
        .member_service
        .toggle_borrowing_permission(&actor, MemberId::from_uuid(member_id))
        .await
        .map_err(error_response)?;
    Ok(Json(MemberResponse::from_member(&member)))
}

// パスワード変更エンドポイント（本人のみ）
async fn change_password(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(member_id): Path<Uuid>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MemberResponse>> {
    validation::validate(&request, PASSWORD_RULES).map_err(validation_failed)?;

    let current_password = request.current_password.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    let member = state
        .member_service
        .change_password(
            &actor,
            MemberId::from_uuid(member_id),
            &current_password,
            &password,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(MemberResponse::from_member(&member)))
}

// 会員の貸出履歴エンドポイント
async fn member_borrowings(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Json<BorrowingHistoryResponse>> {
    let history = state
        .borrowing_query_service
        .member_history(&actor, MemberId::from_uuid(member_id))
        .await
        .map_err(error_response)?;
    let today = state.borrowing_query_service.today();
    Ok(Json(BorrowingHistoryResponse::from_history(&history, today)))
}

// 返却期限が近い貸出のリマインダーエンドポイント
async fn member_reminders(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(member_id): Path<Uuid>,
    query: Result<Query<RemindersQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<BorrowingResponse>>> {
    let params = query_params(query)?;
    let window_days = params.window_days.unwrap_or(DEFAULT_DUE_SOON_WINDOW_DAYS);
    if !(0..=MAX_DUE_SOON_WINDOW_DAYS).contains(&window_days) {
        return Err(invalid_parameter(format!(
            "window_days must be between 0 and {}: {}",
            MAX_DUE_SOON_WINDOW_DAYS, window_days
        )));
    }

    let reminders = state
        .borrowing_query_service
        .due_soon_reminders(&actor, MemberId::from_uuid(member_id), window_days)
        .await
        .map_err(error_response)?;
    let today = state.borrowing_query_service.today();
    Ok(Json(BorrowingResponse::from_borrowings(&reminders, today)))
}

// 書籍一覧エンドポイント
async fn list_books(
    State(state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    query: Result<Query<BooksQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let params = query_params(query)?;
    let result = if params.available.unwrap_or(false) {
        state.book_query_service.get_available_books().await
    } else {
        state.book_query_service.get_all_books().await
    };
    let books = result.map_err(error_response)?;

    Ok(Json(books.iter().map(BookResponse::from_book).collect()))
}

/// 検証済みのリクエストから書誌情報と蔵書数を作成
fn book_input(request: BookRequest) -> Result<(BookDetails, u32), ApplicationError> {
    let quantity = request.quantity.unwrap_or_default();
    let quantity = u32::try_from(quantity).map_err(|_| {
        DomainError::InvalidValue(format!("Quantity is out of range: {}", quantity))
    })?;

    let cover_image = request
        .cover_image
        .filter(|url| !url.trim().is_empty())
        .map(CoverImageUrl::new)
        .transpose()?;
    let details = BookDetails::new(
        request.title.unwrap_or_default(),
        request.author.unwrap_or_default(),
        Isbn::new(request.isbn.unwrap_or_default())?,
        request.description.unwrap_or_default(),
        cover_image,
    )?;
    Ok((details, quantity))
}

// 書籍登録エンドポイント（管理者）
async fn create_book(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(request): Json<BookRequest>,
) -> ApiResult<(StatusCode, Json<BookResponse>)> {
    validation::validate(&request, BOOK_RULES).map_err(validation_failed)?;
    let (details, quantity) = book_input(request).map_err(error_response)?;

    let book = state
        .book_service
        .create_book(&actor, details, quantity)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(BookResponse::from_book(&book))))
}

// 書籍詳細エンドポイント
async fn get_book(
    State(state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<BookResponse>> {
    let book = state
        .book_query_service
        .get_book(BookId::from_uuid(book_id))
        .await
        .map_err(error_response)?;
    Ok(Json(BookResponse::from_book(&book)))
}

// 書籍更新エンドポイント（管理者）
async fn update_book(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(book_id): Path<Uuid>,
    Json(request): Json<BookRequest>,
) -> ApiResult<Json<BookResponse>> {
    validation::validate(&request, BOOK_RULES).map_err(validation_failed)?;
    let (details, quantity) = book_input(request).map_err(error_response)?;

    let book = state
        .book_service
        .update_book(&actor, BookId::from_uuid(book_id), details, quantity)
        .await
        .map_err(error_response)?;
    Ok(Json(BookResponse::from_book(&book)))
}

// 書籍削除エンドポイント（管理者）
async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(book_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .book_service
        .delete_book(&actor, BookId::from_uuid(book_id))
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// クイック貸出エンドポイント（会員自身が今日の日付で借りる）
async fn quick_borrow(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(book_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<BorrowingResponse>)> {
    let borrowing = state
        .borrowing_service
        .quick_borrow(&actor, BookId::from_uuid(book_id))
        .await
        .map_err(|err| map_application_error(err, Severity::Warning))?;
    let today = state.borrowing_query_service.today();
    Ok((
        StatusCode::CREATED,
        Json(BorrowingResponse::from_borrowing(&borrowing, today)),
    ))
}

// 貸出一覧エンドポイント（管理者はすべて、会員は自分の貸出）
async fn list_borrowings(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    query: Result<Query<BorrowingsQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<BorrowingResponse>>> {
    let params = query_params(query)?;
    let filter = params
        .status
        .filter(|s| !s.is_empty())
        .map(|s| BorrowingFilter::from_string(&s))
        .transpose()
        .map_err(|e| invalid_parameter(e.to_string()))?;

    let borrowings = state
        .borrowing_query_service
        .list_borrowings(&actor, filter)
        .await
        .map_err(error_response)?;
    let today = state.borrowing_query_service.today();
    Ok(Json(BorrowingResponse::from_borrowings(&borrowings, today)))
}

// 延滞中の貸出一覧エンドポイント（管理者）
async fn overdue_borrowings(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> ApiResult<Json<Vec<BorrowingResponse>>> {
    let borrowings = state
        .borrowing_query_service
        .overdue_borrowings(&actor)
        .await
        .map_err(error_response)?;
    let today = state.borrowing_query_service.today();
    Ok(Json(BorrowingResponse::from_borrowings(&borrowings, today)))
}

// 貸出記録エンドポイント（管理者）
async fn create_borrowing(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(request): Json<CreateBorrowingRequest>,
) -> ApiResult<(StatusCode, Json<BorrowingResponse>)> {
    validation::validate(&request, BORROWING_RULES).map_err(validation_failed)?;

    let member_id = MemberId::from_string(request.member_id.as_deref().unwrap_or_default())
        .map_err(|e| invalid_parameter(format!("無効な会員ID: {}", e)))?;
    let book_id = BookId::from_string(request.book_id.as_deref().unwrap_or_default())
        .map_err(|e| invalid_parameter(format!("無効な書籍ID: {}", e)))?;
    let borrow_date = NaiveDate::parse_from_str(
        request.borrow_date.as_deref().unwrap_or_default().trim(),
        "%Y-%m-%d",
    )
    .map_err(|e| invalid_parameter(format!("無効な貸出日: {}", e)))?;

    let borrowing = state
        .borrowing_service
        .create_borrowing(&actor, member_id, book_id, borrow_date)
        .await
        .map_err(error_response)?;
    let today = state.borrowing_query_service.today();
    Ok((
        StatusCode::CREATED,
        Json(BorrowingResponse::from_borrowing(&borrowing, today)),
    ))
}

// 貸出詳細エンドポイント（管理者または借りた本人）
async fn get_borrowing(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(borrowing_id): Path<Uuid>,
) -> ApiResult<Json<BorrowingResponse>> {
    let borrowing = state
        .borrowing_query_service
        .get_borrowing(&actor, BorrowingId::from_uuid(borrowing_id))
        .await
        .map_err(error_response)?;
    let today = state.borrowing_query_service.today();
    Ok(Json(BorrowingResponse::from_borrowing(&borrowing, today)))
}

// 返却エンドポイント（管理者）
async fn return_borrowing(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(borrowing_id): Path<Uuid>,
) -> ApiResult<Json<BorrowingResponse>> {
    let borrowing = state
        .borrowing_service
        .return_borrowing(&actor, BorrowingId::from_uuid(borrowing_id))
        .await
        .map_err(error_response)?;
    let today = state.borrowing_query_service.today();
    Ok(Json(BorrowingResponse::from_borrowing(&borrowing, today)))
}

// アプリケーションエラーをHTTPエラーにマッピング
pub fn map_application_error(
    err: ApplicationError,
    severity: Severity,
) -> (StatusCode, Json<ApiError>) {
    let (status, code, message) = match err {
        ApplicationError::DomainError(domain_err) => {
            let (status, code) = map_domain_error(&domain_err);
            (status, code, domain_err.to_string())
        }
        ApplicationError::RepositoryError(repo_err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "REPOSITORY_ERROR",
            repo_err.to_string(),
        ),
        ApplicationError::PasswordHashingFailed(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "PASSWORD_HASHING_FAILED",
            msg,
        ),
        ApplicationError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
    };
    (status, Json(ApiError::new(&message, code, severity)))
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: &DomainError) -> (StatusCode, &'static str) {
    match domain_err {
        DomainError::NotAuthorized(_) => (StatusCode::FORBIDDEN, "NOT_AUTHORIZED"),
        DomainError::Unavailable(_) => (StatusCode::CONFLICT, "BOOK_UNAVAILABLE"),
        DomainError::AlreadyReturned => (StatusCode::CONFLICT, "ALREADY_RETURNED"),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
        DomainError::InsufficientInventory => (StatusCode::CONFLICT, "INSUFFICIENT_INVENTORY"),
        DomainError::Capacity { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "CAPACITY_EXCEEDED")
        }
        DomainError::IncorrectPassword => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INCORRECT_PASSWORD")
        }
        DomainError::InvalidValue(_) => (StatusCode::BAD_REQUEST, "INVALID_VALUE"),
        DomainError::InvalidState(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_STATE"),
    }
}

#[cfg(test)]
mod error_handling_tests {
    use super::*;
    use crate::domain::port::RepositoryError;

    #[test]
    fn test_map_application_error_not_found() {
        let app_error = ApplicationError::NotFound("リソースが見つかりません".to_string());
        let (status, Json(api_error)) = map_application_error(app_error, Severity::Error);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "NOT_FOUND");
        assert_eq!(api_error.error, "リソースが見つかりません");
    }

    #[test]
    fn test_domain_error_status_codes() {
        let cases = [
            (DomainError::NotAuthorized("x".to_string()), StatusCode::FORBIDDEN),
            (DomainError::Unavailable("x".to_string()), StatusCode::CONFLICT),
            (DomainError::AlreadyReturned, StatusCode::CONFLICT),
            (DomainError::Conflict("x".to_string()), StatusCode::CONFLICT),
            (
                DomainError::Capacity {
                    requested: 1,
                    borrowed: 2,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (DomainError::InvalidValue("x".to_string()), StatusCode::BAD_REQUEST),
            (DomainError::IncorrectPassword, StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, expected) in cases {
            let (status, _) = map_application_error(err.into(), Severity::Error);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_repository_error_is_internal() {
        let err = RepositoryError::ConnectionFailed("refused".to_string());
        let (status, Json(api_error)) = map_application_error(err.into(), Severity::Error);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, "REPOSITORY_ERROR");
    }

    #[test]
    fn test_api_error_serialization() {
        let api_error = ApiError::new(
            "Book is not available: Dune",
            "BOOK_UNAVAILABLE",
            Severity::Warning,
        );
        let json = serde_json::to_value(&api_error).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["code"], "BOOK_UNAVAILABLE");
        assert!(json.get("fields").is_none());
    }
}
