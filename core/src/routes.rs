//! Static page table and path matching.
//!
//! Each route maps a URL pattern to a page identifier plus metadata. Patterns
//! are `/`-separated; a `:name` segment captures one non-empty path segment.
//! Matching walks the table in order and falls back to `not-found`.

/// Per-page metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub title: Option<&'static str>,
    pub requires_auth: bool,
    pub require_admin: bool,
}

impl RouteMeta {
    const fn titled(title: &'static str) -> Self {
        Self {
            title: Some(title),
            requires_auth: false,
            require_admin: false,
        }
    }

    const fn admin(title: &'static str) -> Self {
        Self {
            title: Some(title),
            requires_auth: false,
            require_admin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    pub pattern: &'static str,
    pub page: &'static str,
    pub meta: RouteMeta,
}

pub const NOT_FOUND: Route = Route {
    name: "not-found",
    pattern: "*",
    page: "NotFoundView",
    meta: RouteMeta::titled("页面未找到"),
};

pub static ROUTES: &[Route] = &[
    Route { name: "home", pattern: "/", page: "user/HomeView", meta: RouteMeta::titled("首页") },
    Route { name: "login", pattern: "/login", page: "auth/LoginView", meta: RouteMeta::titled("登录") },
    Route { name: "register", pattern: "/register", page: "auth/RegisterView", meta: RouteMeta::titled("注册") },
    Route { name: "preview", pattern: "/preview", page: "user/PreviewView", meta: RouteMeta::titled("电影预告") },
    Route { name: "movies", pattern: "/movies", page: "user/MoviesView", meta: RouteMeta::titled("电影库") },
    Route { name: "movie-detail", pattern: "/movie/:id", page: "user/MovieDetailView", meta: RouteMeta::titled("电影详情") },
    Route { name: "collection", pattern: "/collection", page: "user/CollectionView", meta: RouteMeta::titled("我的收藏") },
    Route { name: "ranking", pattern: "/ranking", page: "user/RankingView", meta: RouteMeta::titled("电影榜单") },
    Route { name: "recommend", pattern: "/recommend", page: "user/RecommendView", meta: RouteMeta::titled("智能推荐") },
    Route {
        name: "payment",
        pattern: "/payment/:movieId",
        page: "user/PaymentView",
        meta: RouteMeta { title: None, requires_auth: true, require_admin: false },
    },
    Route { name: "message", pattern: "/message", page: "user/MessageView", meta: RouteMeta::titled("留言反馈") },
    Route { name: "dashboard", pattern: "/admin/dashboard", page: "admin/DashboardView", meta: RouteMeta::admin("数据看板") },
    Route { name: "admin-users", pattern: "/admin/users", page: "admin/UsersView", meta: RouteMeta::admin("用户管理") },
    Route { name: "admin-movies", pattern: "/admin/movies", page: "admin/MoviesView", meta: RouteMeta::admin("电影管理") },
    Route { name: "admin-movie-add", pattern: "/admin/movie/edit", page: "admin/MovieEditView", meta: RouteMeta::admin("添加电影") },
    Route { name: "admin-movie-edit", pattern: "/admin/movie/edit/:id", page: "admin/MovieEditView", meta: RouteMeta::admin("编辑电影") },
    Route { name: "admin-category", pattern: "/admin/category", page: "admin/CategoryView", meta: RouteMeta::admin("分类管理") },
    Route { name: "admin-region", pattern: "/admin/region", page: "admin/RegionView", meta: RouteMeta::admin("地区管理") },
    Route { name: "admin-orders", pattern: "/admin/orders", page: "admin/OrdersView", meta: RouteMeta::admin("订单管理") },
    Route { name: "admin-comments", pattern: "/admin/comments", page: "admin/CommentsView", meta: RouteMeta::admin("评论管理") },
    Route { name: "admin-messages", pattern: "/admin/messages", page: "admin/MessagesView", meta: RouteMeta::admin("留言管理") },
    Route { name: "admin-carousel", pattern: "/admin/carousel", page: "admin/CarouselManagement", meta: RouteMeta::admin("轮播管理") },
    NOT_FOUND,
];

/// A resolved route and the parameters captured from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'r> {
    pub route: &'r Route,
    pub params: Vec<(&'static str, String)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_not_found(&self) -> bool {
        self.route.name == NOT_FOUND.name
    }
}

pub fn by_name(name: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.name == name)
}

/// Finds the page for `path`. Query strings, fragments and trailing slashes
/// are ignored; anything unmatched resolves to `not-found`.
pub fn resolve(path: &str) -> RouteMatch<'static> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    ROUTES
        .iter()
        .filter(|route| route.pattern != NOT_FOUND.pattern)
        .find_map(|route| {
            match_pattern(route.pattern, &segments).map(|params| RouteMatch { route, params })
        })
        .unwrap_or_else(|| RouteMatch {
            route: ROUTES.last().unwrap_or(&NOT_FOUND),
            params: Vec::new(),
        })
}

fn match_pattern(pattern: &'static str, segments: &[&str]) -> Option<Vec<(&'static str, String)>> {
    let parts: Vec<&'static str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    if parts.len() != segments.len() {
        return None;
    }
    let mut params = Vec::new();
    for (&part, &segment) in parts.iter().zip(segments) {
        match part.strip_prefix(':') {
            Some(name) => params.push((name, segment.to_string())),
            None if part == segment => {}
            None => return None,
        }
    }
    Some(params)
}
