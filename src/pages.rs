//! Static HTML shells for the browser routes. Access control lives in
//! `auth::middleware::page_guard`; the shells only fetch from the JSON API.

use actix_web::{HttpRequest, HttpResponse, http::header::ContentType, web};

fn shell(title: &str, body: &str) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Attendance Tracker</title>
</head>
<body>
<main id="app" data-page="{title}">
{body}
</main>
</body>
</html>
"#
    ))
}

const LOGIN_FORM: &str = r#"<h1>Sign in</h1>
<form id="login" method="post" action="/api/auth/login">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" minlength="6" required></label>
  <button type="submit">Sign in</button>
</form>
<script>
document.getElementById("login").addEventListener("submit", async (e) => {
  e.preventDefault();
  const form = new FormData(e.target);
  const res = await fetch("/api/auth/login", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ email: form.get("email"), password: form.get("password") }),
  });
  const json = await res.json();
  if (json.success) {
    location.href = json.data.role === "ADMIN" ? "/admin" : "/employee";
  } else {
    alert(json.error);
  }
});
</script>"#;

pub async fn login_page() -> HttpResponse {
    shell("Login", LOGIN_FORM)
}

fn section_title(req: &HttpRequest) -> String {
    let section = req.match_info().get("section").unwrap_or("").trim_matches('/');
    let mut chars = section.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Dashboard".to_string(),
    }
}

pub async fn admin_page(req: HttpRequest) -> HttpResponse {
    let title = section_title(&req);
    shell(
        &title,
        &format!(r#"<h1>Admin · {title}</h1><nav data-role="ADMIN"></nav>"#),
    )
}

pub async fn employee_page(req: HttpRequest) -> HttpResponse {
    let title = section_title(&req);
    shell(
        &title,
        &format!(r#"<h1>{title}</h1><nav data-role="EMPLOYEE"></nav>"#),
    )
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(login_page))
        .route("/login", web::get().to(login_page))
        .route("/admin", web::get().to(admin_page))
        .route("/admin/{section:.*}", web::get().to(admin_page))
        .route("/employee", web::get().to(employee_page))
        .route("/employee/{section:.*}", web::get().to(employee_page));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn shells_render_html() {
        let app = test::init_service(App::new().configure(configure)).await;

        let req = test::TestRequest::get().uri("/admin/employees").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("Admin · Employees"));

        let req = test::TestRequest::get().uri("/login").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }
}
