// Rate limit de janela fixa por IP, em memória. Suficiente para uma
// instância única; atrás de um balanceador o limite vale por processo.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::collections::HashMap;
use std::future::{ready, Ready};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::api::metrics;

struct Window {
    count: u32,
    started: Instant,
}

lazy_static::lazy_static! {
    static ref BUCKETS: Mutex<HashMap<String, Window>> = Mutex::new(HashMap::new());
}

fn max_requests() -> u32 {
    std::env::var("RATE_LIMIT_MAX_REQUESTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(120)
}

fn window_secs() -> u64 {
    std::env::var("RATE_LIMIT_WINDOW_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60)
}

/// Registra um hit para a chave e diz se o limite foi estourado.
pub fn register_hit(key: &str, max: u32, window: Duration) -> bool {
    let mut buckets = match BUCKETS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let now = Instant::now();
    let entry = buckets.entry(key.to_string()).or_insert(Window {
        count: 0,
        started: now,
    });

    if now.duration_since(entry.started) > window {
        entry.count = 0;
        entry.started = now;
    }

    entry.count += 1;
    entry.count > max
}

pub struct RateLimit;

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware { service }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        metrics::increment_request_count();

        // Health check fica fora do limite (probes de orquestrador)
        if req.path() == "/health" {
            let fut = self.service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res)
            });
        }

        let peer = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let limited = register_hit(&peer, max_requests(), Duration::from_secs(window_secs()));

        if limited {
            log::warn!("🚦 Rate limit exceeded for {}", peer);
            return Box::pin(async move {
                Err(actix_web::error::ErrorTooManyRequests(
                    "Too many requests, slow down",
                ))
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_trips_after_max() {
        let key = "test-limit-trips";
        let window = Duration::from_secs(60);

        assert!(!register_hit(key, 3, window));
        assert!(!register_hit(key, 3, window));
        assert!(!register_hit(key, 3, window));
        assert!(register_hit(key, 3, window));
    }

    #[test]
    fn test_window_resets() {
        let key = "test-window-resets";
        let window = Duration::from_millis(10);

        assert!(!register_hit(key, 1, window));
        assert!(register_hit(key, 1, window));

        std::thread::sleep(Duration::from_millis(20));
        assert!(!register_hit(key, 1, window));
    }

    #[test]
    fn test_keys_are_independent() {
        let window = Duration::from_secs(60);
        assert!(!register_hit("peer-a", 1, window));
        assert!(!register_hit("peer-b", 1, window));
    }
}
