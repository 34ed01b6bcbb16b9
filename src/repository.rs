use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::analysis_request::{self, RequestStatus};
use crate::entities::{region, result, source_image, user};
use crate::utils::file_validator::file_extension;

/// Idempotent upsert keyed by the Telegram id. The display name is refreshed
/// only when it changed; the role is never touched here.
pub async fn get_or_create_user(
    db: &DatabaseConnection,
    telegram_id: i64,
    username: Option<&str>,
) -> Result<user::Model, DbErr> {
    if let Some(existing) = user::Entity::find_by_id(telegram_id).one(db).await? {
        if let Some(name) = username {
            if existing.username.as_deref() != Some(name) {
                let mut active: user::ActiveModel = existing.into();
                active.username = Set(Some(name.to_string()));
                return active.update(db).await;
            }
        }
        return Ok(existing);
    }

    let created = user::ActiveModel {
        telegram_id: Set(telegram_id),
        username: Set(username.map(str::to_string)),
        role: Set(user::Role::Operator),
        registered_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await?;

    println!("Store | created user {} ({:?})", telegram_id, created.username);
    Ok(created)
}

/// Creates the SourceImage and its AnalysisRequest (status PENDING) in one
/// transaction; a failure of either write rolls back both. The region is the
/// first available one, a placeholder until operators pick it themselves.
pub async fn create_analysis_request(
    db: &DatabaseConnection,
    user_id: i64,
    file_path: &str,
    file_size: i64,
    algorithm_name: &str,
) -> Result<analysis_request::Model, DbErr> {
    let txn = db.begin().await?;

    let ext = file_extension(std::path::Path::new(file_path));
    let image = source_image::ActiveModel {
        id: Set(Uuid::new_v4()),
        file_path: Set(file_path.to_string()),
        file_size: Set(Some(file_size)),
        file_extension: Set((!ext.is_empty()).then_some(ext)),
        uploaded_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    let region_id = region::Entity::find().one(&txn).await?.map(|r| r.id);

    let request = analysis_request::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        region_id: Set(region_id),
        source_image_id: Set(image.id),
        algorithm_name: Set(algorithm_name.to_string()),
        status: Set(RequestStatus::Pending),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    println!("Store | created analysis request {} for user {}", request.id, user_id);
    Ok(request)
}

/// Persists a status value from the closed enumeration. Idempotent; returns
/// false when the request does not exist.
pub async fn update_status(
    db: &DatabaseConnection,
    request_id: Uuid,
    status: RequestStatus,
) -> Result<bool, DbErr> {
    let res = analysis_request::Entity::update_many()
        .col_expr(analysis_request::Column::Status, Expr::value(status.as_str()))
        .filter(analysis_request::Column::Id.eq(request_id))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        eprintln!("Store | update_status | request {} not found", request_id);
        return Ok(false);
    }
    println!("Store | request {} status -> {}", request_id, status.as_str());
    Ok(true)
}

pub async fn create_result(
    db: &impl sea_orm::ConnectionTrait,
    request_id: Uuid,
    metadata: serde_json::Value,
) -> Result<result::Model, DbErr> {
    result::ActiveModel {
        id: Set(Uuid::new_v4()),
        analysis_request_id: Set(request_id),
        metadata: Set(metadata),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

/// Sets status COMPLETED and inserts the Result row in a single transaction,
/// so readers never observe COMPLETED without a result.
pub async fn complete_with_result(
    db: &DatabaseConnection,
    request_id: Uuid,
    metadata: serde_json::Value,
) -> Result<result::Model, DbErr> {
    let txn = db.begin().await?;

    analysis_request::Entity::update_many()
        .col_expr(
            analysis_request::Column::Status,
            Expr::value(RequestStatus::Completed.as_str()),
        )
        .filter(analysis_request::Column::Id.eq(request_id))
        .exec(&txn)
        .await?;

    let row = create_result(&txn, request_id, metadata).await?;

    txn.commit().await?;

    println!("Store | request {} completed with result {}", request_id, row.id);
    Ok(row)
}

pub async fn find_request(
    db: &DatabaseConnection,
    request_id: Uuid,
) -> Result<Option<(analysis_request::Model, Option<result::Model>)>, DbErr> {
    analysis_request::Entity::find_by_id(request_id)
        .find_also_related(result::Entity)
        .one(db)
        .await
}

/// Newest-first listing of a user's requests, optionally filtered by status.
/// Returns (page of rows, total items, total pages).
pub async fn list_requests(
    db: &DatabaseConnection,
    user_id: i64,
    status: Option<RequestStatus>,
    page: u64,
    limit: u64,
) -> Result<(Vec<analysis_request::Model>, u64, u64), DbErr> {
    let mut query = analysis_request::Entity::find()
        .filter(analysis_request::Column::UserId.eq(user_id))
        .order_by_desc(analysis_request::Column::CreatedAt);

    if let Some(status) = status {
        query = query.filter(analysis_request::Column::Status.eq(status.as_str()));
    }

    let paginator = query.paginate(db, limit);
    let total_items = paginator.num_items().await?;
    let total_pages = paginator.num_pages().await?;
    let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((rows, total_items, total_pages))
}
