//! HTTP response handlers.

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use super::ServeContext;
use super::page::render_page;
use crate::live::{LongPoll, PollOutcome};
use crate::utils::date::{format_http_date, parse_since};
use crate::utils::mime;

/// `GET /`: the page for the current registry contents.
pub fn respond_page(request: Request, ctx: &ServeContext) -> Result<()> {
    let files = ctx.registry.get_files();
    let body = render_page(&files, &ctx.server);
    let mut response = Response::from_data(body.into_bytes())
        .with_header(make_header("Content-Type", mime::HTML));

    if let Some(updated) = files.iter().map(|file| file.updated_at).max()
        && let Ok(header) = Header::from_bytes("Last-Modified", format_http_date(updated))
    {
        response.add_header(header);
    }

    request.respond(response)?;
    Ok(())
}

/// `HEAD /`: answer now, or park until the registry changes.
///
/// - no or unparseable `If-Modified-Since` → 200
/// - `If-Modified-Since` is an HTTP-date or the page's RFC 3339 cursor
/// - changed since then → 200, immediately or once a change lands
/// - nothing changed within the poll timeout → 304
/// - server shutting down → 503
pub fn respond_poll(request: Request, ctx: &ServeContext) -> Result<()> {
    let Some(since) = if_modified_since(&request) else {
        return send_empty(request, 200);
    };

    let outcome = LongPoll::new(&ctx.registry, since, ctx.poll_timeout, &ctx.cancel).run();

    let status = match outcome {
        PollOutcome::Changed => 200,
        PollOutcome::NotModified => 304,
        PollOutcome::Cancelled => 503,
    };
    send_empty(request, status)
}

pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, mime::PLAIN, b"404 Not Found".to_vec())
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", mime::PLAIN))
        .with_header(make_header("Allow", "GET, HEAD"));
    request.respond(response)?;
    Ok(())
}

fn if_modified_since(request: &Request) -> Option<chrono::DateTime<chrono::Utc>> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("If-Modified-Since"))
        .and_then(|h| parse_since(h.value.as_str()))
}

fn send_empty(request: Request, status: u16) -> Result<()> {
    request.respond(Response::empty(StatusCode(status)))?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
