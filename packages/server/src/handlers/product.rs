use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::StorageConfig;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, importation, product};
use crate::error::{AppError, ErrorBody, FieldErrors};
use crate::extractors::auth::AuthUser;
use crate::extractors::input::AppInput;
use crate::extractors::path::AppPath;
use crate::extractors::query::AppQuery;
use crate::models::product::*;
use crate::models::shared::{page_offset, resolve_page};
use crate::state::AppState;
use crate::utils::upload::{ImportTarget, ImportTypeError, check_import_type};

#[utoipa::path(
    get,
    path = "/",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List products",
    description = "Returns one page of products ordered by ID, each with its category. `per_page` defaults to 15 and is clamped to 1-100.",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Page of products", body = ProductListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_products(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductListQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let catalog = &state.config.catalog;
    let (page, per_page) = resolve_page(
        query.page,
        query.per_page,
        catalog.per_page,
        catalog.max_per_page,
    );

    let total = product::Entity::find().count(&state.db).await?;
    let data = match page_offset(page, per_page, total) {
        Some(offset) => product::Entity::find()
            .find_also_related(category::Entity)
            .order_by_asc(product::Column::Id)
            .offset(Some(offset))
            .limit(Some(per_page))
            .all(&state.db)
            .await?
            .into_iter()
            .map(product_response)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(Json(ProductListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/create",
    tag = "Products",
    operation_id = "productCreateForm",
    summary = "Data for the product creation form",
    responses(
        (status = 200, description = "Available categories", body = CreateFormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_form(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CreateFormResponse>, AppError> {
    Ok(Json(CreateFormResponse {
        categories: all_categories(&state.db).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Products",
    operation_id = "storeProduct",
    summary = "Create a product",
    description = "Accepts JSON or an urlencoded form. All four fields are required and `category` must name an existing category.",
    request_body = ProductForm,
    responses(
        (status = 201, description = "Product created", body = Redirect<ProductResponse>),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Invalid fields (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, form), fields(id))]
pub async fn store_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppInput(form): AppInput<ProductForm>,
) -> Result<impl IntoResponse, AppError> {
    let (input, category) = validate_product(&state.db, &form).await?;

    let now = chrono::Utc::now();
    let new_product = product::ActiveModel {
        name: Set(input.name),
        price: Set(input.price),
        description: Set(input.description),
        category_id: Set(input.category_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_product.insert(&state.db).await?;
    tracing::Span::current().record("id", model.id);

    Ok((
        StatusCode::CREATED,
        Json(Redirect::success(
            PRODUCTS_INDEX,
            PRODUCT_CREATED,
            ProductResponse::new(model, category.into()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    operation_id = "showProduct",
    summary = "Get a product by ID",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn show_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<ProductResponse>, AppError> {
    Ok(Json(find_product(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/{id}/edit",
    tag = "Products",
    operation_id = "productEditForm",
    summary = "Data for the product edit form",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product and available categories", body = EditFormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn edit_form(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<EditFormResponse>, AppError> {
    Ok(Json(EditFormResponse {
        product: find_product(&state.db, id).await?,
        categories: all_categories(&state.db).await?,
    }))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Replace a product",
    description = "Replaces all four fields. Validation rules are the same as for creation.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = ProductForm,
    responses(
        (status = 200, description = "Product updated", body = Redirect<ProductResponse>),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Invalid fields (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, form), fields(id))]
pub async fn update_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppInput(form): AppInput<ProductForm>,
) -> Result<Json<Redirect<ProductResponse>>, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_product_for_update(&txn, id).await?;
    let (input, category) = validate_product(&txn, &form).await?;

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(input.name);
    active.price = Set(input.price);
    active.description = Set(input.description);
    active.category_id = Set(input.category_id);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;

    txn.commit().await?;

    Ok(Json(Redirect::success(
        PRODUCTS_INDEX,
        PRODUCT_UPDATED,
        ProductResponse::new(model, category.into()),
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    operation_id = "destroyProduct",
    summary = "Delete a product",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted; `data` holds the removed record", body = Redirect<ProductResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn destroy_product(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Redirect<ProductResponse>>, AppError> {
    let txn = state.db.begin().await?;
    let model = find_product_for_update(&txn, id).await?;
    let category = model.find_related(category::Entity).one(&txn).await?;
    let removed = product_response((model, category))?;

    product::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(Redirect::success(PRODUCTS_INDEX, PRODUCT_DELETED, removed)))
}

#[utoipa::path(
    post,
    path = "/import",
    tag = "Imports",
    operation_id = "importProducts",
    summary = "Upload a product import file",
    description = "Stores a csv or plain-text file of at most 5120 KB for later importation and records it for the current user. The file is not processed by this request.",
    request_body(content_type = "multipart/form-data", description = "Import file in the `file` field"),
    responses(
        (status = 201, description = "File stored", body = Redirect<ImportationResponse>),
        (status = 400, description = "Malformed multipart body, or a body more than 1 MiB over the file cap; no `errors` map (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Missing, oversized or non-text file in `errors.file` (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn import_products(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let storage = &state.config.storage;
    let bytes = read_import_file(&mut multipart, storage).await?;

    let target = ImportTarget::generate(storage)?;
    let record = importation::ActiveModel {
        path: Set(target.recorded_path.clone()),
        user_id: Set(auth_user.user_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    // The row stays even if the write below fails.
    state.disk.put(&target.disk_path, &bytes).await?;
    tracing::info!(path = %record.path, size = bytes.len(), "Stored import file");

    Ok((
        StatusCode::CREATED,
        Json(Redirect::success(
            PRODUCTS_INDEX,
            IMPORT_ACCEPTED,
            ImportationResponse::from(record),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/imports",
    tag = "Imports",
    operation_id = "listImports",
    summary = "List the current user's import files",
    description = "Newest first.",
    responses(
        (status = 200, description = "Importations of the current user", body = ImportationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_imports(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ImportationListResponse>, AppError> {
    let rows = importation::Entity::find()
        .filter(importation::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(importation::Column::CreatedAt)
        .order_by_desc(importation::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(ImportationListResponse {
        total: rows.len() as u64,
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Body limit for the import route: the file cap plus room for the multipart envelope.
pub fn import_body_limit(storage: &StorageConfig) -> DefaultBodyLimit {
    let limit = storage.max_import_bytes().saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// Pull the `file` field out of the request and check it against the import rules.
async fn read_import_file(
    multipart: &mut Multipart,
    storage: &StorageConfig,
) -> Result<Vec<u8>, AppError> {
    let max_bytes = storage.max_import_bytes();
    let mut errors = FieldErrors::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let mut data = Vec::new();
        let mut oversized = false;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?
        {
            if oversized || (data.len() + chunk.len()) as u64 > max_bytes {
                // Drain the rest of the field before responding.
                oversized = true;
                continue;
            }
            data.extend_from_slice(&chunk);
        }

        match check_import_type(file_name.as_deref(), &data) {
            Ok(()) => {}
            Err(ImportTypeError::MissingFileName) if data.is_empty() => {
                errors.add("file", "The file field is required.");
            }
            Err(_) => errors.add("file", "The file must be a file of type: csv, txt."),
        }
        if oversized {
            errors.add(
                "file",
                format!(
                    "The file may not be greater than {} kilobytes.",
                    storage.max_import_kb
                ),
            );
        }

        errors.into_result()?;
        return Ok(data);
    }

    errors.add("file", "The file field is required.");
    Err(AppError::InvalidFields(errors))
}

/// Check a product form, including that its category exists.
async fn validate_product<C: ConnectionTrait>(
    db: &C,
    form: &ProductForm,
) -> Result<(ProductInput, category::Model), AppError> {
    let (fields, mut errors) = form.check();

    let category = match fields.category_id {
        Some(id) => category::Entity::find_by_id(id).one(db).await?,
        None => None,
    };
    if fields.category_id.is_some() && category.is_none() {
        errors.add("category", CATEGORY_INVALID);
    }
    errors.into_result()?;

    match (fields.into_input(), category) {
        (Some(input), Some(category)) => Ok((input, category)),
        _ => Err(AppError::Internal(
            "product form passed validation with missing fields".into(),
        )),
    }
}

async fn all_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<CategorySummary>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    Ok(categories.into_iter().map(Into::into).collect())
}

/// Combine a product with its joined category.
fn product_response(
    (model, category): (product::Model, Option<category::Model>),
) -> Result<ProductResponse, AppError> {
    match category {
        Some(category) => Ok(ProductResponse::new(model, category.into())),
        None => Err(AppError::Internal(format!(
            "Category {} of product {} missing",
            model.category_id, model.id
        ))),
    }
}

async fn find_product<C: ConnectionTrait>(db: &C, id: i32) -> Result<ProductResponse, AppError> {
    let row = product::Entity::find_by_id(id)
        .find_also_related(category::Entity)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    product_response(row)
}

async fn find_product_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<product::Model, AppError> {
    use sea_orm::sea_query::LockType;
    product::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}
