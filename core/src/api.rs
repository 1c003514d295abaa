//! Domain-named calls over the transport core.
//!
//! Each function fixes a path, shapes its arguments into a payload and makes
//! exactly one `create` call. Results and errors pass through untouched.

use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::http::Transport;
use crate::notify::Notifier;
use crate::types::{LoginRequest, RegisterRequest};

pub async fn login<T: Transport, N: Notifier>(
    client: &ApiClient<T, N>,
    username: &str,
    password: &str,
) -> Result<Value, ClientError> {
    let request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    client.create("/auth/login", &request).await
}

pub async fn register<T: Transport, N: Notifier>(
    client: &ApiClient<T, N>,
    user_data: &RegisterRequest,
) -> Result<Value, ClientError> {
    client.create("/auth/register", user_data).await
}

pub mod user {
    use super::*;
    use crate::types::UserIdRequest;

    pub async fn get_user_info<T: Transport, N: Notifier>(
        client: &ApiClient<T, N>,
        user_id: u64,
    ) -> Result<Value, ClientError> {
        client.create("/user/info", &UserIdRequest { user_id }).await
    }

    pub async fn update_user_info<T: Transport, N: Notifier, U: Serialize + ?Sized>(
        client: &ApiClient<T, N>,
        user_info: &U,
    ) -> Result<Value, ClientError> {
        client.create("/user/update", user_info).await
    }
}

pub mod movie {
    use super::*;
    use crate::types::{CollectRequest, MovieIdRequest};

    pub async fn get_movies<T: Transport, N: Notifier, P: Serialize + ?Sized>(
        client: &ApiClient<T, N>,
        params: &P,
    ) -> Result<Value, ClientError> {
        client.create("/movie/list", params).await
    }

    pub async fn get_movie_detail<T: Transport, N: Notifier>(
        client: &ApiClient<T, N>,
        movie_id: u64,
    ) -> Result<Value, ClientError> {
        client.create("/movie/detail", &MovieIdRequest { movie_id }).await
    }

    pub async fn collect_movie<T: Transport, N: Notifier>(
        client: &ApiClient<T, N>,
        user_id: u64,
        movie_id: u64,
    ) -> Result<Value, ClientError> {
        client.create("/movie/collect", &CollectRequest { user_id, movie_id }).await
    }
}

pub mod admin {
    use super::*;

    pub async fn get_users<T: Transport, N: Notifier, P: Serialize + ?Sized>(
        client: &ApiClient<T, N>,
        params: &P,
    ) -> Result<Value, ClientError> {
        client.create("/admin/users", params).await
    }

    pub async fn get_orders<T: Transport, N: Notifier, P: Serialize + ?Sized>(
        client: &ApiClient<T, N>,
        params: &P,
    ) -> Result<Value, ClientError> {
        client.create("/admin/orders", params).await
    }

    pub async fn manage_movie<T: Transport, N: Notifier, M: Serialize + ?Sized>(
        client: &ApiClient<T, N>,
        movie_data: &M,
    ) -> Result<Value, ClientError> {
        client.create("/admin/movie/manage", movie_data).await
    }
}
