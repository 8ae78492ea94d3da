use crate::AppState;
use crate::api::models::accounts::{
    AccountIdResponse, AccountListResponse, AccountResponse, CheckAccountValidRequest, CheckAccountValidResponse,
    CreateAccountRequest, DeleteAccountResponse, GetAccountListRequest, IsUsernameTakenResponse, UpdateAccountRequest,
    UpdatePasswordRequest,
};
use crate::errors::Result;
use crate::types::AccountId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/accounts",
    tag = "accounts",
    summary = "Create account",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountIdResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Username already taken"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountIdResponse>)> {
    let account_id = state.service.create_account(request.account_info, request.password).await?;
    Ok((StatusCode::CREATED, Json(AccountIdResponse { account_id })))
}

#[utoipa::path(
    post,
    path = "/accounts/check",
    tag = "accounts",
    summary = "Check credentials",
    description = "A wrong password yields an empty `account_id`, not an error.",
    request_body = CheckAccountValidRequest,
    responses(
        (status = 200, description = "Check result", body = CheckAccountValidResponse),
        (status = 404, description = "No account with that username"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn check_account_valid(
    State(state): State<AppState>,
    Json(request): Json<CheckAccountValidRequest>,
) -> Result<Json<CheckAccountValidResponse>> {
    let account_id = state.service.check_account_valid(&request.username, request.password).await?;
    Ok(Json(CheckAccountValidResponse { account_id }))
}

#[utoipa::path(
    get,
    path = "/accounts/usernames/{username}",
    tag = "accounts",
    summary = "Check whether a username is taken",
    params(("username" = String, Path, description = "Username to check")),
    responses(
        (status = 200, description = "Probe result", body = IsUsernameTakenResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn is_username_taken(State(state): State<AppState>, Path(username): Path<String>) -> Result<Json<IsUsernameTakenResponse>> {
    let is_taken = state.service.is_username_taken(&username).await?;
    Ok(Json(IsUsernameTakenResponse { is_taken }))
}

#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "accounts",
    summary = "Get account",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_account(State(state): State<AppState>, Path(id): Path<AccountId>) -> Result<Json<AccountResponse>> {
    Ok(Json(state.service.get_account(id).await?))
}

#[utoipa::path(
    get,
    path = "/accounts",
    tag = "accounts",
    summary = "List all accounts",
    responses(
        (status = 200, description = "All accounts ordered by id", body = AccountListResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_account_all(State(state): State<AppState>) -> Result<Json<AccountListResponse>> {
    let accounts = state.service.get_account_all().await?;
    Ok(Json(AccountListResponse { accounts }))
}

#[utoipa::path(
    post,
    path = "/accounts/batch",
    tag = "accounts",
    summary = "Get accounts by id",
    description = "Ids with no matching account are left out of the result.",
    request_body = GetAccountListRequest,
    responses(
        (status = 200, description = "Matching accounts ordered by id", body = AccountListResponse),
        (status = 400, description = "Empty id list"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_account_list(
    State(state): State<AppState>,
    Json(request): Json<GetAccountListRequest>,
) -> Result<Json<AccountListResponse>> {
    let accounts = state.service.get_account_list(&request.account_ids).await?;
    Ok(Json(AccountListResponse { accounts }))
}

#[utoipa::path(
    put,
    path = "/accounts/{id}",
    tag = "accounts",
    summary = "Update account",
    description = "Overwrites fullname, email, phone number and role. The username cannot be changed.",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountIdResponse),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountIdResponse>> {
    let account_id = state.service.update_account_info(id, request.account_info).await?;
    Ok(Json(AccountIdResponse { account_id }))
}

#[utoipa::path(
    put,
    path = "/accounts/{id}/password",
    tag = "accounts",
    summary = "Replace account password",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = AccountIdResponse),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_account_password(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<AccountIdResponse>> {
    let account_id = state.service.update_account_password(id, request.password).await?;
    Ok(Json(AccountIdResponse { account_id }))
}

#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    tag = "accounts",
    summary = "Delete account",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_account(State(state): State<AppState>, Path(id): Path<AccountId>) -> Result<StatusCode> {
    state.service.delete_account(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/accounts/usernames/{username}",
    tag = "accounts",
    summary = "Delete account by username",
    params(("username" = String, Path, description = "Username of the account to delete")),
    responses(
        (status = 200, description = "Account deleted", body = DeleteAccountResponse),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_account_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<DeleteAccountResponse>> {
    let username = state.service.delete_account_by_username(&username).await?;
    Ok(Json(DeleteAccountResponse { username }))
}

#[cfg(test)]
mod tests {
    use crate::api::models::accounts::{
        AccountIdResponse, AccountListResponse, AccountResponse, CheckAccountValidResponse, DeleteAccountResponse,
        IsUsernameTakenResponse, Role,
    };
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    fn create_body(username: &str, password: &str) -> serde_json::Value {
        json!({
            "account_info": {
                "username": username,
                "fullname": "Test User",
                "email": format!("{username}@example.com"),
                "phone_number": "+1 555 0100",
                "role": "member"
            },
            "password": password
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_account(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let response = app.post("/v1/accounts").json(&create_body("alice", "pw")).await;
        response.assert_status(StatusCode::CREATED);
        let created: AccountIdResponse = response.json();

        let response = app.get(&format!("/v1/accounts/{}", created.account_id)).await;
        response.assert_status_ok();
        let account: AccountResponse = response.json();
        assert_eq!(account.account_id, created.account_id);
        assert_eq!(account.account_info.username, "alice");
        assert_eq!(account.account_info.role, Role::Member);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_duplicate_conflicts(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        app.post("/v1/accounts").json(&create_body("bob", "pw")).await.assert_status(StatusCode::CREATED);

        let response = app.post("/v1/accounts").json(&create_body("bob", "pw")).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Account bob already exists");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_blank_username_is_bad_request(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let response = app.post("/v1/accounts").json(&create_body("  ", "pw")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_check_account_valid(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let created: AccountIdResponse = app.post("/v1/accounts").json(&create_body("carol", "secret")).await.json();

        let response = app
            .post("/v1/accounts/check")
            .json(&json!({ "username": "carol", "password": "secret" }))
            .await;
        response.assert_status_ok();
        let check: CheckAccountValidResponse = response.json();
        assert_eq!(check.account_id, Some(created.account_id));

        let check: CheckAccountValidResponse = app
            .post("/v1/accounts/check")
            .json(&json!({ "username": "carol", "password": "nope" }))
            .await
            .json();
        assert_eq!(check.account_id, None);

        app.post("/v1/accounts/check")
            .json(&json!({ "username": "nobody", "password": "secret" }))
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_username_check_and_delete_by_username(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let taken: IsUsernameTakenResponse = app.get("/v1/accounts/usernames/dave").await.json();
        assert!(!taken.is_taken);

        app.post("/v1/accounts").json(&create_body("dave", "pw")).await.assert_status(StatusCode::CREATED);
        let taken: IsUsernameTakenResponse = app.get("/v1/accounts/usernames/dave").await.json();
        assert!(taken.is_taken);

        let response = app.delete("/v1/accounts/usernames/dave").await;
        response.assert_status_ok();
        let deleted: DeleteAccountResponse = response.json();
        assert_eq!(deleted.username, "dave");

        app.delete("/v1/accounts/usernames/dave").await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_batch(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let mut ids = Vec::new();
        for name in ["erin", "frank", "gina"] {
            let created: AccountIdResponse = app.post("/v1/accounts").json(&create_body(name, "pw")).await.json();
            ids.push(created.account_id);
        }

        let all: AccountListResponse = app.get("/v1/accounts").await.json();
        assert_eq!(all.accounts.len(), 3);

        let response = app
            .post("/v1/accounts/batch")
            .json(&json!({ "account_ids": [ids[2], 999, ids[0]] }))
            .await;
        response.assert_status_ok();
        let some: AccountListResponse = response.json();
        assert_eq!(
            some.accounts.iter().map(|a| a.account_id).collect::<Vec<_>>(),
            vec![ids[0], ids[2]]
        );

        app.post("/v1/accounts/batch")
            .json(&json!({ "account_ids": [] }))
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_account_and_password(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let created: AccountIdResponse = app.post("/v1/accounts").json(&create_body("hank", "old")).await.json();
        let path = format!("/v1/accounts/{}", created.account_id);

        let response = app
            .put(&path)
            .json(&json!({
                "account_info": {
                    "username": "ignored",
                    "fullname": "Hank H",
                    "email": "hank@example.com",
                    "phone_number": "",
                    "role": "admin"
                }
            }))
            .await;
        response.assert_status_ok();

        let account: AccountResponse = app.get(&path).await.json();
        assert_eq!(account.account_info.username, "hank");
        assert_eq!(account.account_info.fullname, "Hank H");
        assert_eq!(account.account_info.role, Role::Admin);

        app.put(&format!("{path}/password"))
            .json(&json!({ "password": "new" }))
            .await
            .assert_status_ok();
        let check: CheckAccountValidResponse = app
            .post("/v1/accounts/check")
            .json(&json!({ "username": "hank", "password": "new" }))
            .await
            .json();
        assert_eq!(check.account_id, Some(created.account_id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_account_by_id(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let created: AccountIdResponse = app.post("/v1/accounts").json(&create_body("ivy", "pw")).await.json();
        let path = format!("/v1/accounts/{}", created.account_id);

        app.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        app.get(&path).await.assert_status_not_found();
        app.delete(&path).await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_internal_errors_are_opaque(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        pool.close().await;

        let response = app.get("/v1/accounts").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Internal server error");
    }
}
