use std::{collections::BTreeSet, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

/// Success discriminant carried in every envelope.
pub const SUCCESS_CODE: i64 = 200;

/// Uniform response wrapper; every body the backend produces has this shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub message: Option<String>,
    pub data: Value,
}

impl Envelope {
    pub fn success(data: impl Serialize, message: &str) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: Some(message.to_string()),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }

    pub fn error(code: i64, message: &str) -> Self {
        Self {
            code,
            message: Some(message.to_string()),
            data: Value::Null,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub profession: Option<String>,
    pub phone: Option<String>,
    pub admin: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub year: Option<u32>,
    pub rating: f64,
    pub is_free: bool,
    pub price: Option<f64>,
    pub actors: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub user_id: u64,
    pub movie_id: u64,
    pub amount: f64,
    pub status: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub profession: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdInput {
    pub user_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(alias = "id")]
    pub user_id: u64,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub profession: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ListInput {
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub keyword: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieIdInput {
    pub movie_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectInput {
    pub user_id: u64,
    pub movie_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInput {
    pub id: Option<u64>,
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub is_free: bool,
    pub price: Option<f64>,
    pub actors: Option<String>,
}

/// In-memory backing store for the mock backend.
#[derive(Debug, Default)]
pub struct Store {
    pub users: Vec<User>,
    pub movies: Vec<Movie>,
    pub orders: Vec<Order>,
    pub collections: BTreeSet<(u64, u64)>,
}

impl Store {
    /// Store with an administrator account, a regular user, two movies and
    /// one order.
    pub fn seeded() -> Self {
        let users = vec![
            User {
                id: 1,
                username: "admin".to_string(),
                password: "admin123".to_string(),
                gender: None,
                age: None,
                profession: None,
                phone: None,
                admin: true,
            },
            User {
                id: 2,
                username: "alice".to_string(),
                password: "secret".to_string(),
                gender: Some("female".to_string()),
                age: Some(28),
                profession: Some("editor".to_string()),
                phone: None,
                admin: false,
            },
        ];
        let movies = vec![
            Movie {
                id: 1,
                title: "霸王别姬".to_string(),
                year: Some(1993),
                rating: 9.6,
                is_free: true,
                price: None,
                actors: Some("张国荣,张丰毅,巩俐".to_string()),
            },
            Movie {
                id: 2,
                title: "让子弹飞".to_string(),
                year: Some(2010),
                rating: 9.0,
                is_free: false,
                price: Some(9.9),
                actors: Some("姜文,葛优,周润发".to_string()),
            },
        ];
        let orders = vec![Order {
            id: 1,
            user_id: 2,
            movie_id: 2,
            amount: 9.9,
            status: "PAID".to_string(),
        }];
        Self {
            users,
            movies,
            orders,
            collections: BTreeSet::new(),
        }
    }

    fn next_user_id(&self) -> u64 {
        self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1
    }

    fn next_movie_id(&self) -> u64 {
        self.movies.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/user/info", post(user_info))
        .route("/user/update", post(update_user))
        .route("/movie/list", get(list_movies_query).post(list_movies))
        .route("/movie/detail", post(movie_detail))
        .route("/movie/collect", post(collect_movie))
        .route("/movies/{id}", put(replace_movie).delete(delete_movie))
        .route("/admin/users", post(admin_users))
        .route("/admin/orders", post(admin_orders))
        .route("/admin/movie/manage", post(manage_movie))
        .route("/faults/status/{code}", get(fault_status))
        .route("/faults/status/{code}/message", get(fault_status_with_message))
        .route("/faults/malformed", get(fault_malformed))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> Json<Envelope> {
    let store = db.read().await;
    let user = store
        .users
        .iter()
        .find(|u| u.username == input.username && u.password == input.password);
    match user {
        Some(user) => Json(Envelope::success(auth_response(user), "登录成功")),
        None => Json(Envelope::error(400, "用户名或密码错误")),
    }
}

async fn register(State(db): State<Db>, Json(input): Json<RegisterInput>) -> Json<Envelope> {
    let mut store = db.write().await;
    if store.users.iter().any(|u| u.username == input.username) {
        return Json(Envelope::error(400, "用户名已存在"));
    }
    let user = User {
        id: store.next_user_id(),
        username: input.username,
        password: input.password,
        gender: input.gender,
        age: input.age,
        profession: input.profession,
        phone: input.phone,
        admin: false,
    };
    let response = auth_response(&user);
    store.users.push(user);
    Json(Envelope::success(response, "注册成功"))
}

fn auth_response(user: &User) -> Value {
    serde_json::json!({
        "userId": user.id,
        "username": user.username,
        "admin": user.admin,
    })
}

async fn user_info(State(db): State<Db>, Json(input): Json<UserIdInput>) -> Json<Envelope> {
    let store = db.read().await;
    match store.users.iter().find(|u| u.id == input.user_id) {
        Some(user) => Json(Envelope::success(user, "获取成功")),
        None => Json(Envelope::error(400, "用户不存在")),
    }
}

async fn update_user(State(db): State<Db>, Json(input): Json<UpdateUserInput>) -> Json<Envelope> {
    let mut store = db.write().await;
    let Some(user) = store.users.iter_mut().find(|u| u.id == input.user_id) else {
        return Json(Envelope::error(400, "用户不存在"));
    };
    if input.gender.is_some() {
        user.gender = input.gender;
    }
    if input.age.is_some() {
        user.age = input.age;
    }
    if input.profession.is_some() {
        user.profession = input.profession;
    }
    if input.phone.is_some() {
        user.phone = input.phone;
    }
    Json(Envelope::success(&*user, "更新成功"))
}

/// List bodies are optional; anything that is not a list object means "defaults".
fn list_input(body: &[u8]) -> ListInput {
    serde_json::from_slice(body).unwrap_or_default()
}

fn page_of<T: Clone>(items: &[T], input: &ListInput) -> Vec<T> {
    let size = input.size.unwrap_or(10).max(1);
    let page = input.page.unwrap_or(1).max(1);
    items.iter().skip((page - 1).saturating_mul(size)).take(size).cloned().collect()
}

fn filtered_movies(store: &Store, input: &ListInput) -> Vec<Movie> {
    let matching: Vec<Movie> = store
        .movies
        .iter()
        .filter(|m| match &input.keyword {
            Some(keyword) => m.title.contains(keyword.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    page_of(&matching, input)
}

async fn list_movies_query(State(db): State<Db>, Query(input): Query<ListInput>) -> Json<Envelope> {
    let store = db.read().await;
    Json(Envelope::success(filtered_movies(&store, &input), "获取成功"))
}

async fn list_movies(State(db): State<Db>, body: Bytes) -> Json<Envelope> {
    let input = list_input(&body);
    let store = db.read().await;
    Json(Envelope::success(filtered_movies(&store, &input), "获取成功"))
}

async fn movie_detail(State(db): State<Db>, Json(input): Json<MovieIdInput>) -> Json<Envelope> {
    let store = db.read().await;
    match store.movies.iter().find(|m| m.id == input.movie_id) {
        Some(movie) => Json(Envelope::success(movie, "获取成功")),
        None => Json(Envelope::error(400, "电影不存在")),
    }
}

async fn collect_movie(State(db): State<Db>, Json(input): Json<CollectInput>) -> Json<Envelope> {
    let mut store = db.write().await;
    if !store.movies.iter().any(|m| m.id == input.movie_id) {
        return Json(Envelope::error(400, "电影不存在"));
    }
    if !store.collections.insert((input.user_id, input.movie_id)) {
        return Json(Envelope::error(400, "已收藏该电影"));
    }
    Json(Envelope::success(true, "收藏成功"))
}

fn movie_from_input(id: u64, input: MovieInput) -> Result<Movie, Envelope> {
    if !input.is_free && input.price.is_none() {
        return Err(Envelope::error(400, "付费电影必须设置价格"));
    }
    Ok(Movie {
        id,
        title: input.title,
        year: input.year,
        rating: 0.0,
        is_free: input.is_free,
        price: input.price,
        actors: input.actors,
    })
}

async fn replace_movie(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<MovieInput>,
) -> Json<Envelope> {
    let mut store = db.write().await;
    let Some(position) = store.movies.iter().position(|m| m.id == id) else {
        return Json(Envelope::error(400, "电影不存在"));
    };
    match movie_from_input(id, input) {
        Ok(movie) => {
            store.movies[position] = movie.clone();
            Json(Envelope::success(movie, "更新成功"))
        }
        Err(envelope) => Json(envelope),
    }
}

async fn delete_movie(State(db): State<Db>, Path(id): Path<u64>) -> Json<Envelope> {
    let mut store = db.write().await;
    let before = store.movies.len();
    store.movies.retain(|m| m.id != id);
    if store.movies.len() == before {
        return Json(Envelope::error(400, "电影不存在"));
    }
    Json(Envelope::success(Value::Null, "删除成功"))
}

async fn admin_users(State(db): State<Db>, body: Bytes) -> Json<Envelope> {
    let input = list_input(&body);
    let store = db.read().await;
    Json(Envelope::success(page_of(&store.users, &input), "获取成功"))
}

async fn admin_orders(State(db): State<Db>, body: Bytes) -> Json<Envelope> {
    let input = list_input(&body);
    let store = db.read().await;
    Json(Envelope::success(page_of(&store.orders, &input), "获取成功"))
}

async fn manage_movie(State(db): State<Db>, Json(input): Json<MovieInput>) -> Json<Envelope> {
    let mut store = db.write().await;
    match input.id {
        Some(id) => {
            let Some(position) = store.movies.iter().position(|m| m.id == id) else {
                return Json(Envelope::error(400, "电影不存在"));
            };
            match movie_from_input(id, input) {
                Ok(movie) => {
                    store.movies[position] = movie.clone();
                    Json(Envelope::success(movie, "更新成功"))
                }
                Err(envelope) => Json(envelope),
            }
        }
        None => {
            let id = store.next_movie_id();
            match movie_from_input(id, input) {
                Ok(movie) => {
                    store.movies.push(movie.clone());
                    Json(Envelope::success(movie, "创建成功"))
                }
                Err(envelope) => Json(envelope),
            }
        }
    }
}

fn status_or_500(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn fault_status(Path(code): Path<u16>) -> Response {
    status_or_500(code).into_response()
}

async fn fault_status_with_message(Path(code): Path<u16>) -> Response {
    let status = status_or_500(code);
    let envelope = Envelope::error(i64::from(status.as_u16()), "故障注入");
    (status, Json(envelope)).into_response()
}

async fn fault_malformed() -> Response {
    (StatusCode::OK, "<html>maintenance</html>").into_response()
}
