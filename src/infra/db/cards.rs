//! Read-only queries against the marketplace's entity tables.
//!
//! Each query selects exactly the fields a card displays. Aggregates
//! (review averages, product counts) are computed here rather than fetched
//! row-by-row; a card request pays one round-trip per entity.

use async_trait::async_trait;
use sqlx::query_as;
use uuid::Uuid;

use crate::{
    application::repos::{CardSourceRepo, RepoError},
    domain::entities::{BusinessCard, FundCard, InviteCard, ProductCard},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    image_url: Option<String>,
    price_cents: i64,
    currency: String,
    rating: Option<f64>,
    review_count: i64,
    business_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct FundRow {
    id: Uuid,
    title: String,
    cover_url: Option<String>,
    current_amount_cents: i64,
    target_amount_cents: i64,
    currency: String,
    owner_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct BusinessRow {
    id: Uuid,
    name: String,
    logo_url: Option<String>,
    tagline: Option<String>,
    rating: Option<f64>,
    product_count: i64,
}

#[derive(sqlx::FromRow)]
struct InviteRow {
    code: String,
    business_name: Option<String>,
    role: String,
}

#[async_trait]
impl CardSourceRepo for PostgresRepositories {
    async fn product_card(&self, id: Uuid) -> Result<Option<ProductCard>, RepoError> {
        let row = query_as::<_, ProductRow>(
            "SELECT p.id, p.name, p.image_url, p.price_cents, p.currency, \
                    AVG(r.rating)::FLOAT8 AS rating, \
                    COUNT(r.id) AS review_count, \
                    b.name AS business_name \
             FROM products p \
             LEFT JOIN businesses b ON b.id = p.business_id \
             LEFT JOIN product_reviews r ON r.product_id = p.id \
             WHERE p.id = $1 \
             GROUP BY p.id, p.name, p.image_url, p.price_cents, p.currency, b.name",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| ProductCard {
            id: row.id,
            name: row.name,
            image_url: row.image_url,
            price_cents: row.price_cents,
            currency: row.currency,
            rating: row.rating,
            review_count: row.review_count,
            business_name: row.business_name,
        }))
    }

    async fn fund_card(&self, id: Uuid) -> Result<Option<FundCard>, RepoError> {
        let row = query_as::<_, FundRow>(
            "SELECT f.id, f.title, f.cover_url, f.current_amount_cents, \
                    f.target_amount_cents, f.currency, \
                    u.display_name AS owner_name \
             FROM funds f \
             LEFT JOIN users u ON u.id = f.owner_id \
             WHERE f.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| FundCard {
            id: row.id,
            title: row.title,
            cover_url: row.cover_url,
            current_amount_cents: row.current_amount_cents,
            target_amount_cents: row.target_amount_cents,
            currency: row.currency,
            owner_name: row.owner_name,
        }))
    }

    async fn business_card(&self, id: Uuid) -> Result<Option<BusinessCard>, RepoError> {
        let row = query_as::<_, BusinessRow>(
            "SELECT b.id, b.name, b.logo_url, b.tagline, \
                    AVG(r.rating)::FLOAT8 AS rating, \
                    COUNT(DISTINCT p.id) AS product_count \
             FROM businesses b \
             LEFT JOIN products p ON p.business_id = b.id \
             LEFT JOIN product_reviews r ON r.product_id = p.id \
             WHERE b.id = $1 \
             GROUP BY b.id, b.name, b.logo_url, b.tagline",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| BusinessCard {
            id: row.id,
            name: row.name,
            logo_url: row.logo_url,
            tagline: row.tagline,
            rating: row.rating,
            product_count: row.product_count,
        }))
    }

    async fn invite_card(&self, code: &str) -> Result<Option<InviteCard>, RepoError> {
        let row = query_as::<_, InviteRow>(
            "SELECT i.code, b.name AS business_name, i.role \
             FROM admin_invites i \
             LEFT JOIN businesses b ON b.id = i.business_id \
             WHERE i.code = $1",
        )
        .bind(code)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| InviteCard {
            code: row.code,
            business_name: row.business_name,
            role: row.role,
        }))
    }
}
