//! OpenAPI documentation for the account API, served at `/openapi.json`.

use utoipa::OpenApi;

use crate::api::{self, handlers::accounts, handlers::health};

#[derive(OpenApi)]
#[openapi(
    info(title = "Account Service", description = "Account and credential lifecycle API"),
    servers(
        (url = "/v1", description = "Account API")
    ),
    paths(
        accounts::create_account,
        accounts::check_account_valid,
        accounts::is_username_taken,
        accounts::get_account,
        accounts::get_account_all,
        accounts::get_account_list,
        accounts::update_account,
        accounts::update_account_password,
        accounts::delete_account,
        accounts::delete_account_by_username,
        health::healthz,
    ),
    components(
        schemas(
            api::models::accounts::Role,
            api::models::accounts::AccountInfo,
            api::models::accounts::CreateAccountRequest,
            api::models::accounts::CheckAccountValidRequest,
            api::models::accounts::GetAccountListRequest,
            api::models::accounts::UpdateAccountRequest,
            api::models::accounts::UpdatePasswordRequest,
            api::models::accounts::AccountIdResponse,
            api::models::accounts::CheckAccountValidResponse,
            api::models::accounts::IsUsernameTakenResponse,
            api::models::accounts::AccountResponse,
            api::models::accounts::AccountListResponse,
            api::models::accounts::DeleteAccountResponse,
        )
    ),
    tags(
        (name = "accounts", description = "Account lifecycle"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
