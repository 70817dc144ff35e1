use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use tracing::info;

use afftrack::api::middleware::{AdvertiserAuth, RequestIdMiddleware, WebhookAuth};
use afftrack::api::services::{
    AppStartTime, conversion_routes, health_routes, registration_routes, teaser_routes,
    webhook_routes,
};
use afftrack::cache::create_dedup_cache;
use afftrack::client::{BrokerGateway, ConfiguredOrderStrategy, HttpBrokerGateway};
use afftrack::config::{get_config, init_config};
use afftrack::errors::AfftrackError;
use afftrack::logging::init_logging;
use afftrack::services::{
    ConversionService, GoalResolver, RegistrationService, StatusLabelMap, TeaserService,
    WebhookService,
};
use afftrack::storage::{
    ClickStore, ConversionStatus, ConversionStore, GoalStore, RegistrationStore, SeaOrmStorage,
    TransactionStore,
};

fn exit_with(error: AfftrackError) -> ! {
    eprintln!("{}", error.format_colored());
    std::process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    dotenvy::dotenv().ok();
    init_config();
    let config = get_config();

    let _log_guard = init_logging(config);

    // 配置校验失败直接退出：带病启动只会把错误推迟到第一个 webhook
    if let Err(e) = config.validate() {
        exit_with(e);
    }

    let storage = Arc::new(
        SeaOrmStorage::new(&config.database.database_url, &config.database.backend)
            .await
            .unwrap_or_else(|e| exit_with(e)),
    );

    let dedup_cache = create_dedup_cache(&config.cache)
        .await
        .unwrap_or_else(|e| exit_with(e));

    let strategy = Arc::new(ConfiguredOrderStrategy::from_config(&config.brokers));
    let broker: Arc<dyn BrokerGateway> = Arc::new(
        HttpBrokerGateway::new(&config.brokers, strategy).unwrap_or_else(|e| exit_with(e)),
    );

    let goal_resolver = GoalResolver::new(storage.clone() as Arc<dyn GoalStore>);

    let registration_service = Arc::new(RegistrationService::new(
        storage.clone() as Arc<dyn ClickStore>,
        storage.clone() as Arc<dyn TransactionStore>,
        storage.clone() as Arc<dyn RegistrationStore>,
        storage.clone() as Arc<dyn ConversionStore>,
        goal_resolver,
        broker.clone(),
    ));

    let conversion_service = Arc::new(ConversionService::new(
        storage.clone() as Arc<dyn ClickStore>,
        storage.clone() as Arc<dyn ConversionStore>,
    ));

    let webhook_labels = StatusLabelMap::from_config(&config.webhook.status_labels)
        .unwrap_or_else(|e| exit_with(e));
    let default_status = ConversionStatus::parse(&config.webhook.default_status)
        .unwrap_or(ConversionStatus::Approved);

    let webhook_service = Arc::new(WebhookService::new(
        storage.clone() as Arc<dyn RegistrationStore>,
        storage.clone() as Arc<dyn TransactionStore>,
        conversion_service.clone(),
        broker.clone(),
        webhook_labels,
        default_status,
    ));

    let teaser_service = Arc::new(TeaserService::new(dedup_cache));

    info!(
        "Starting afftrack server at {}:{} ({} workers, {} brokers configured)",
        config.server.host,
        config.server.port,
        config.server.cpu_count,
        config.brokers.providers.len()
    );

    HttpServer::new(move || {
        let cors = if config.server.cors_origin.is_empty() {
            Cors::default()
        } else {
            Cors::default()
                .allowed_origin(&config.server.cors_origin)
                .allowed_methods(["GET", "POST"])
                .allow_any_header()
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(registration_service.clone()))
            .app_data(web::Data::new(conversion_service.clone()))
            .app_data(web::Data::new(webhook_service.clone()))
            .app_data(web::Data::new(teaser_service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .service(health_routes())
            .service(registration_routes())
            .service(conversion_routes().wrap(AdvertiserAuth))
            .service(webhook_routes().wrap(WebhookAuth))
            .service(teaser_routes().wrap(WebhookAuth))
    })
    .workers(config.server.cpu_count)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
