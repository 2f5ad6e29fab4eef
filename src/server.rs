//! Local HTTP surface for the finished report.
//!
//! `GET /` serves the page, `GET /charts/<n>.png` serves PNG charts, every
//! other GET is a 404 and any other method a 405.

use crate::error::{ReportError, Result};
use crate::page::{chart_path, RenderedCharts};
use crate::runtime::RenderedChart;
use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

/// Everything the server hands out, fixed before the first request
#[derive(Debug, Clone)]
pub struct Site {
    pub page: String,
    pub charts: RenderedCharts,
}

/// Status, content type and body of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }
}

impl Site {
    pub fn new(page: String, charts: RenderedCharts) -> Self {
        Self { page, charts }
    }

    fn png(&self, path: &str) -> Option<&RenderedChart> {
        let relative = path.strip_prefix('/')?;
        let index: usize = relative
            .strip_prefix("charts/")?
            .strip_suffix(".png")?
            .parse()
            .ok()?;
        match self.charts.get(index) {
            Some(chart @ RenderedChart::Png(_)) if chart_path(index) == relative => Some(chart),
            _ => None,
        }
    }

    /// Route one request. The query string is ignored.
    pub fn respond(&self, method: &Method, url: &str) -> Reply {
        if method != &Method::Get {
            return Reply::text(405, "method not allowed");
        }

        let path = url.split('?').next().unwrap_or(url);
        if path == "/" || path == "/index.html" {
            return Reply {
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: self.page.as_bytes().to_vec(),
            };
        }

        match self.png(path) {
            Some(chart) => Reply {
                status: 200,
                content_type: chart.content_type(),
                body: chart.as_bytes().to_vec(),
            },
            None => Reply::text(404, "not found"),
        }
    }
}

fn handle(site: &Site, request: Request) {
    let reply = site.respond(request.method(), request.url());
    if reply.status == 404 {
        warn!(url = request.url(), "unknown path");
    } else {
        debug!(method = %request.method(), url = request.url(), status = reply.status, "request");
    }

    let mut response: Response<Cursor<Vec<u8>>> =
        Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }

    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to send response");
    }
}

/// Bind `addr` and serve `site` until the process is killed
pub fn serve(addr: &str, site: Site) -> Result<()> {
    let server = Server::http(addr).map_err(|e| ReportError::Serve {
        addr: addr.to_string(),
        message: e.to_string(),
    })?;
    info!(addr, "serving report");
    run(&server, &site);
    Ok(())
}

/// Single-threaded accept loop
pub fn run(server: &Server, site: &Site) {
    for request in server.incoming_requests() {
        handle(site, request);
    }
}
