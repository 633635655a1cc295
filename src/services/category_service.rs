use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::categories::{CategoryList, CategoryNode, CategoryTree, CreateCategoryRequest},
    entity::categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Active root categories, each with its active direct children.
pub async fn get_category_tree(state: &AppState) -> AppResult<ApiResponse<CategoryTree>> {
    let all = Categories::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;

    let roots = build_tree(all);
    let meta = Meta::count(roots.len());
    Ok(ApiResponse::success("OK", CategoryTree { roots }, Some(meta)))
}

/// Every active non-root category, optionally narrowed to one parent.
pub async fn get_subcategories(
    state: &AppState,
    parent_id: Option<Uuid>,
) -> AppResult<ApiResponse<CategoryList>> {
    let mut finder = Categories::find()
        .filter(Column::ParentId.is_not_null())
        .filter(Column::IsActive.eq(true));
    if let Some(parent_id) = parent_id {
        finder = finder.filter(Column::ParentId.eq(parent_id));
    }
    let items: Vec<Category> = finder
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("OK", CategoryList { items }, Some(meta)))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CategoryNode>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let children = Categories::find()
        .filter(Column::ParentId.eq(category.id))
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    Ok(ApiResponse::ok(
        "OK",
        CategoryNode {
            category: category.into(),
            children,
        },
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    let taken = Categories::find()
        .filter(Column::Name.eq(name))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Validation("Category already exists".into()));
    }

    if let Some(parent_id) = payload.parent_id {
        Categories::find_by_id(parent_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::not_found("Parent category"))?;
    }

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        parent_id: Set(payload.parent_id),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::ok("Category created", category.into()))
}

fn build_tree(all: Vec<CategoryModel>) -> Vec<CategoryNode> {
    let (roots, children): (Vec<_>, Vec<_>) = all.into_iter().partition(|c| c.parent_id.is_none());
    roots
        .into_iter()
        .map(|root| {
            let kids = children
                .iter()
                .filter(|c| c.parent_id == Some(root.id))
                .cloned()
                .map(Category::from)
                .collect();
            CategoryNode {
                category: root.into(),
                children: kids,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, parent_id: Option<Uuid>) -> CategoryModel {
        CategoryModel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn children_are_grouped_under_their_root() {
        let fiction = category("Fiction", None);
        let science = category("Science", None);
        let fantasy = category("Fantasy", Some(fiction.id));
        let physics = category("Physics", Some(science.id));

        let tree = build_tree(vec![fiction.clone(), fantasy, science, physics]);
        assert_eq!(tree.len(), 2);
        let fiction_node = tree
            .iter()
            .find(|n| n.category.id == fiction.id)
            .expect("fiction root");
        assert_eq!(fiction_node.children.len(), 1);
        assert_eq!(fiction_node.children[0].name, "Fantasy");
    }
}
