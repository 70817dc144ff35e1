use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use subtle::ConstantTimeEq;
use tracing::{info, trace};

use crate::api::jwt::get_jwt_service;

/// 已认证的 advertiser 身份，由 handler 从 request extensions 读取
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvertiserIdentity(pub i64);

/// Advertiser authentication middleware (Bearer JWT)
#[derive(Clone)]
pub struct AdvertiserAuth;

impl<S, B> Transform<S, ServiceRequest> for AdvertiserAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdvertiserAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdvertiserAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AdvertiserAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> AdvertiserAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// Handle OPTIONS requests for CORS preflight
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    /// Handle unauthorized requests
    fn handle_unauthorized(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        info!("Advertiser authentication failed - invalid or missing token");
        req.into_response(
            HttpResponse::Unauthorized()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(serde_json::json!({
                    "result": "error",
                    "error": "Unauthorized: Invalid or missing token"
                }))
                .map_into_right_body(),
        )
    }

    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    }
}

impl<S, B> Service<ServiceRequest> for AdvertiserAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            // Handle CORS preflight requests
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            if let Some(token) = Self::extract_bearer_token(&req) {
                match get_jwt_service().validate_advertiser_token(&token) {
                    Ok(advertiser_id) => {
                        trace!("Advertiser {} authenticated", advertiser_id);
                        req.extensions_mut().insert(AdvertiserIdentity(advertiser_id));
                        let response = srv.call(req).await?.map_into_left_body();
                        return Ok(response);
                    }
                    Err(e) => {
                        info!("Advertiser token validation failed: {}", e);
                    }
                }
            }

            Ok(Self::handle_unauthorized(req))
        })
    }
}

/// Webhook authentication middleware (shared token, constant-time compare)
#[derive(Clone)]
pub struct WebhookAuth;

impl<S, B> Transform<S, ServiceRequest> for WebhookAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = WebhookAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct WebhookAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> WebhookAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// Token 未配置时隐藏整组端点
    fn handle_missing_token(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NotFound()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body("Not Found")
                .map_into_right_body(),
        )
    }

    fn handle_unauthorized(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        info!("Webhook authentication failed - invalid or missing token");
        req.into_response(
            HttpResponse::Unauthorized()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(serde_json::json!({
                    "result": "error",
                    "error": "Unauthorized"
                }))
                .map_into_right_body(),
        )
    }

    fn token_matches(req: &ServiceRequest, expected: &str) -> bool {
        let presented = req
            .headers()
            .get("X-Webhook-Token")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        // 常数时间比较，避免计时侧信道
        presented.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}

impl<S, B> Service<ServiceRequest> for WebhookAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let webhook_token = &crate::config::get_config().api.webhook_token;

            if webhook_token.is_empty() {
                return Ok(Self::handle_missing_token(req));
            }

            if !Self::token_matches(&req, webhook_token) {
                return Ok(Self::handle_unauthorized(req));
            }

            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
