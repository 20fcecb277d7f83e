use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        user::{AccountProfile, UserRole},
        wishlist::DEFAULT_WISHLIST_NAME,
    },
    dto::auth::{DeleteAccountRequest, DeletionScheduled, EditProfileRequest, RegisterRequest},
    entity::{
        CustomerAddresses, Customers, DeleteRequests, Sellers, Users,
        carts::ActiveModel as CartActive, customer_addresses::Column as AddressCol,
        customers::ActiveModel as CustomerActive,
        delete_requests::{ActiveModel as DeleteRequestActive, Column as DeleteRequestCol},
        sellers::ActiveModel as SellerActive,
        users::{ActiveModel as UserActive, Column as UserCol},
        wishlists::ActiveModel as WishlistActive,
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_role},
    models::{Account, CustomerAddress},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug)]
struct NewAccount {
    email: String,
    name: String,
    surname: String,
    role: UserRole,
    company_name: Option<String>,
    phone_number: Option<String>,
}

fn validate_registration(payload: RegisterRequest) -> AppResult<NewAccount> {
    let mut errors = FieldErrors::default();
    errors.require_text("email", &payload.email, 254);
    let email = payload.email.trim().to_ascii_lowercase();
    if !email.is_empty() && !looks_like_email(&email) {
        errors.add("email", "Email not valid");
    }
    errors.require_text("name", &payload.name, 32);
    errors.require_text("surname", &payload.surname, 32);

    let role = match payload.role.parse::<UserRole>() {
        Ok(UserRole::Admin) => {
            errors.add("role", "Admin accounts cannot be registered");
            None
        }
        Ok(role) => Some(role),
        Err(_) => {
            errors.add("role", format!("Invalid role: {}", payload.role));
            None
        }
    };

    let company_name = payload
        .company_name
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    match (role, company_name.as_deref()) {
        (Some(UserRole::Seller), None) => errors.add("company_name", "Missing company_name"),
        (Some(UserRole::Seller), Some(name)) => errors.require_text("company_name", name, 64),
        _ => {}
    }

    let phone_number = payload
        .phone_number
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if let Some(phone) = phone_number.as_deref() {
        errors.require_text("phone_number", phone, 32);
    }

    errors.into_result()?;
    let role = role.ok_or_else(|| AppError::Internal(anyhow::anyhow!("role missing after validation")))?;

    Ok(NewAccount {
        email,
        name: payload.name.trim().to_string(),
        surname: payload.surname.trim().to_string(),
        role,
        company_name,
        phone_number,
    })
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Creates the base user and its role record. Customers also get their cart and
/// the default wishlist in the same transaction.
pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Account>> {
    let account = validate_registration(payload)?;

    let txn = state.orm.begin().await?;

    let taken = Users::find()
        .filter(UserCol::Email.eq(account.email.as_str()))
        .count(&txn)
        .await?;
    if taken > 0 {
        return Err(AppError::AlreadyExists("Email".into()));
    }

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(account.email.clone()),
        name: Set(account.name.clone()),
        surname: Set(account.surname.clone()),
        role: Set(account.role.as_str().to_string()),
        created_at: Set(now.into()),
        modified_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| AppError::unique_or(err, || AppError::AlreadyExists("Email".into())))?;

    match account.role {
        UserRole::Customer => {
            CustomerActive {
                id: Set(user.id),
                phone_number: Set(account.phone_number.clone()),
            }
            .insert(&txn)
            .await?;
            CartActive {
                id: Set(Uuid::new_v4()),
                customer_id: Set(user.id),
            }
            .insert(&txn)
            .await?;
            WishlistActive {
                id: Set(Uuid::new_v4()),
                customer_id: Set(user.id),
                name: Set(DEFAULT_WISHLIST_NAME.to_string()),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
        }
        UserRole::Seller => {
            SellerActive {
                id: Set(user.id),
                company_name: Set(account.company_name.clone().unwrap_or_default()),
                rating: Set(None),
            }
            .insert(&txn)
            .await?;
        }
        UserRole::Admin => {
            return Err(AppError::Unauthorized);
        }
    }

    let profile = load_account(&txn, user.id).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, role = %account.role, "account registered");
    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "users",
        json!({ "user_id": user.id, "role": account.role }),
    )
    .await;

    Ok(ApiResponse::success("Account created", profile, Some(Meta::empty())))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Account>> {
    let account = load_account(&state.orm, user.user_id).await?;
    if account.profile.role() != user.role {
        tracing::debug!(user_id = %user.user_id, "token role does not match stored role");
        return Err(AppError::Unauthorized);
    }
    Ok(ApiResponse::success("OK", account, Some(Meta::empty())))
}

/// Accounts stay usable for this long after a deletion request.
pub const DELETION_GRACE_DAYS: i64 = 30;

const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Default, PartialEq)]
struct ProfileChanges {
    name: Option<String>,
    surname: Option<String>,
    phone_number: Option<Option<String>>,
    company_name: Option<String>,
}

fn validate_profile_edit(role: UserRole, payload: EditProfileRequest) -> AppResult<ProfileChanges> {
    let mut errors = FieldErrors::default();
    if let Some(name) = payload.name.as_deref() {
        errors.require_text("name", name, 32);
    }
    if let Some(surname) = payload.surname.as_deref() {
        errors.require_text("surname", surname, 32);
    }

    let phone_number = match (role, payload.phone_number) {
        (_, None) => None,
        (UserRole::Customer, Some(phone)) => {
            let phone = phone.trim().to_string();
            if phone.chars().count() > 32 {
                errors.add("phone_number", "phone_number must be at most 32 characters");
            }
            Some(Some(phone).filter(|p| !p.is_empty()))
        }
        (_, Some(_)) => {
            errors.add("phone_number", "phone_number is only kept for customers");
            None
        }
    };

    let company_name = match (role, payload.company_name) {
        (_, None) => None,
        (UserRole::Seller, Some(company)) => {
            errors.require_text("company_name", &company, 64);
            Some(company.trim().to_string())
        }
        (_, Some(_)) => {
            errors.add("company_name", "company_name is only kept for sellers");
            None
        }
    };

    errors.into_result()?;
    Ok(ProfileChanges {
        name: payload.name.map(|n| n.trim().to_string()),
        surname: payload.surname.map(|s| s.trim().to_string()),
        phone_number,
        company_name,
    })
}

/// Partial update of the caller's profile. Absent fields are left alone.
pub async fn edit_profile(
    state: &AppState,
    user: &AuthUser,
    payload: EditProfileRequest,
) -> AppResult<ApiResponse<Account>> {
    ensure_role(user, &[UserRole::Customer, UserRole::Seller])?;
    let changes = validate_profile_edit(user.role, payload)?;

    let txn = state.orm.begin().await?;
    let stored = Users::find_by_id(user.user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let stored = match stored {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };
    if UserRole::from_db(&stored.role)? != user.role {
        return Err(AppError::Unauthorized);
    }

    if changes.name.is_some() || changes.surname.is_some() {
        let mut active: UserActive = stored.into();
        if let Some(name) = changes.name.clone() {
            active.name = Set(name);
        }
        if let Some(surname) = changes.surname.clone() {
            active.surname = Set(surname);
        }
        active.modified_at = Set(Utc::now().into());
        active.update(&txn).await?;
    }

    if let Some(phone_number) = changes.phone_number.clone() {
        let customer = match Customers::find_by_id(user.user_id).one(&txn).await? {
            Some(c) => c,
            None => return Err(AppError::NotFound),
        };
        let mut active: CustomerActive = customer.into();
        active.phone_number = Set(phone_number);
        active.update(&txn).await?;
    }

    if let Some(company_name) = changes.company_name.clone() {
        let seller = match Sellers::find_by_id(user.user_id).one(&txn).await? {
            Some(s) => s,
            None => return Err(AppError::NotFound),
        };
        let mut active: SellerActive = seller.into();
        active.company_name = Set(company_name);
        active.update(&txn).await?;
    }

    let account = load_account(&txn, user.user_id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "profile_edit",
        "users",
        json!({
            "name": changes.name.is_some(),
            "surname": changes.surname.is_some(),
            "phone_number": changes.phone_number.is_some(),
            "company_name": changes.company_name.is_some(),
        }),
    )
    .await;

    Ok(ApiResponse::success("Profile updated", account, Some(Meta::empty())))
}

/// Records that the caller wants their account removed once the grace period is over.
/// The account keeps working until then; removal itself runs outside this service.
pub async fn request_deletion(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteAccountRequest,
) -> AppResult<ApiResponse<DeletionScheduled>> {
    ensure_role(user, &[UserRole::Customer, UserRole::Seller])?;

    let mut errors = FieldErrors::default();
    errors.require_text("reason", &payload.reason, MAX_REASON_LEN);
    errors.into_result()?;

    if Users::find_by_id(user.user_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let pending = DeleteRequests::find()
        .filter(DeleteRequestCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    if pending > 0 {
        return Err(AppError::AlreadyExists("Delete request".into()));
    }

    let requested_at = Utc::now();
    let to_be_removed_at = requested_at + Duration::days(DELETION_GRACE_DAYS);
    DeleteRequestActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        reason: Set(payload.reason.trim().to_string()),
        requested_at: Set(requested_at.into()),
        to_be_removed_at: Set(to_be_removed_at.into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        AppError::unique_or(err, || AppError::AlreadyExists("Delete request".into()))
    })?;

    tracing::info!(user_id = %user.user_id, %to_be_removed_at, "account deletion requested");
    audit::record(
        &state.pool,
        user.user_id,
        "account_delete_request",
        "delete_requests",
        json!({ "to_be_removed_at": to_be_removed_at }),
    )
    .await;

    Ok(ApiResponse::success(
        format!(
            "Your account will be deleted in {DELETION_GRACE_DAYS} days. You can still use it until {}.",
            to_be_removed_at.format("%d/%m/%Y")
        ),
        DeletionScheduled {
            requested_at,
            to_be_removed_at,
        },
        Some(Meta::empty()),
    ))
}

/// Base user plus the role specific record, read in one go.
pub async fn load_account<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Account> {
    let user = match Users::find_by_id(user_id).one(conn).await? {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let profile = match UserRole::from_db(&user.role)? {
        UserRole::Customer => {
            let customer = match Customers::find_by_id(user.id).one(conn).await? {
                Some(c) => c,
                None => return Err(AppError::NotFound),
            };
            let addresses = CustomerAddresses::find()
                .filter(AddressCol::CustomerId.eq(user.id))
                .order_by_asc(AddressCol::CreatedAt)
                .all(conn)
                .await?
                .into_iter()
                .map(CustomerAddress::from)
                .collect();
            AccountProfile::Customer {
                phone_number: customer.phone_number,
                addresses,
            }
        }
        UserRole::Seller => {
            let seller = match Sellers::find_by_id(user.id).one(conn).await? {
                Some(s) => s,
                None => return Err(AppError::NotFound),
            };
            AccountProfile::Seller {
                company_name: seller.company_name,
                rating: seller.rating,
            }
        }
        UserRole::Admin => AccountProfile::Admin,
    };

    Ok(Account {
        id: user.id,
        email: user.email,
        name: user.name,
        surname: user.surname,
        created_at: user.created_at.with_timezone(&Utc),
        profile,
    })
}
