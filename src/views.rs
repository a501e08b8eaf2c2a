use std::fmt::Write;

use crate::{auth::repo_types::User, auth::session::Flash, forms::FieldErrors, practice::goal};

/// Field key for errors that belong to the whole form.
pub const FORM_ERRORS: &str = "form";

/// What every page needs besides its own content.
pub struct Page<'a> {
    pub flashes: &'a [Flash],
    pub errors: &'a FieldErrors,
    pub csrf_token: Option<&'a str>,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> String {
    let mut notices = String::new();
    if !flashes.is_empty() {
        notices.push_str("<ul class=\"flashes\">");
        for f in flashes {
            let _ = write!(
                notices,
                "<li class=\"{}\">{}</li>",
                escape(&f.category),
                escape(&f.message)
            );
        }
        notices.push_str("</ul>");
    }
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{notices}\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn error_list(errors: &FieldErrors, field: &str) -> String {
    if !errors.has(field) {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errors\">");
    for m in errors.get(field) {
        let _ = write!(out, "<li>{}</li>", escape(m));
    }
    out.push_str("</ul>");
    out
}

fn form_open(page: &Page, action: &str) -> String {
    let mut out = format!("<form method=\"post\" action=\"{action}\">");
    if let Some(token) = page.csrf_token {
        let _ = write!(
            out,
            "<input type=\"hidden\" name=\"csrf_token\" value=\"{}\">",
            escape(token)
        );
    }
    out.push_str(&error_list(page.errors, "csrf_token"));
    out.push_str(&error_list(page.errors, FORM_ERRORS));
    out
}

fn input(page: &Page, kind: &str, name: &str, label: &str, value: &str) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label> <input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{value}\">{errors}</p>",
        value = escape(value),
        errors = error_list(page.errors, name),
    )
}

pub fn login_page(page: &Page, email: &str) -> String {
    let body = format!(
        "<h1>Log in</h1>{open}{email}{password}<p><button type=\"submit\">Log in</button></p></form>\
         <p>No account yet? <a href=\"/register\">Register</a></p>",
        open = form_open(page, "/login"),
        email = input(page, "email", "email", "Email", email),
        password = input(page, "password", "password", "Password", ""),
    );
    layout("Log in", page.flashes, &body)
}

pub fn register_page(page: &Page, username: &str, email: &str) -> String {
    let body = format!(
        "<h1>Register</h1>{open}{username}{email}{password}{confirm}<p><button type=\"submit\">Sign up</button></p></form>\
         <p>Already registered? <a href=\"/login\">Log in</a></p>",
        open = form_open(page, "/register"),
        username = input(page, "text", "username", "Username", username),
        email = input(page, "email", "email", "Email", email),
        password = input(page, "password", "password", "Password", ""),
        confirm = input(page, "password", "confirm_password", "Confirm Password", ""),
    );
    layout("Register", page.flashes, &body)
}

pub fn dashboard_page(page: &Page, user: &User, time_to_goal_years: Option<f64>) -> String {
    let projection = match time_to_goal_years {
        Some(years) => format!(
            "<p class=\"projection\">Estimated time to reach {} hours: {:.2} years at {} hours a day.</p>",
            goal::GOAL_HOURS,
            years,
            goal::ASSUMED_DAILY_HOURS
        ),
        None => String::new(),
    };
    let body = format!(
        "<h1>Welcome, {name}</h1><p class=\"total\">Total hours: {total}</p>{projection}\
         {open}{hours}<p><button type=\"submit\">Add</button></p></form>",
        name = escape(&user.username),
        total = user.total_hours,
        open = form_open(page, "/dashboard"),
        hours = input(page, "number", "hours", "Enter hours of practice today", ""),
    );
    layout("Dashboard", page.flashes, &body)
}

pub fn server_error_page() -> String {
    layout(
        "Internal Server Error",
        &[],
        "<h1>Internal Server Error</h1><p>Something went wrong. Please try again.</p>",
    )
}
