use super::setup_test_db;
use crate::database::{DuplicatePage, ListOrder, PageQuery, PageRepository};
use crate::domain::Page;
use chrono::{Duration, NaiveDateTime};

fn base_time() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2023-01-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

// create a fake page, `minutes` after the base time
fn create_mock_page(group_id: Option<&str>, name: &str, lang: &str, minutes: i64) -> Page {
    let mut page = Page::new(
        group_id.map(str::to_string),
        name.to_string(),
        base_time() + Duration::minutes(minutes),
    );
    page.lang = lang.to_string();
    page.title = format!("Title of {}", name);
    page.content = Some("<p>Hello</p>".to_string());
    page
}

#[tokio::test]
async fn test_sqlite_save_and_retrieve() {
    let repo = setup_test_db().await;

    let page = create_mock_page(None, "about", "en", 0);
    repo.save_page(&page).await.expect("Should save page");

    let retrieved = repo
        .get_page(None, "about", Some("en"))
        .await
        .expect("Should query")
        .expect("Should find page");

    assert_eq!(retrieved, page);
}

#[tokio::test]
async fn test_sqlite_scopes_are_separate() {
    let repo = setup_test_db().await;
    repo.save_page(&create_mock_page(Some("org-1"), "about", "en", 0))
        .await
        .unwrap();

    assert!(repo.get_page(None, "about", Some("en")).await.unwrap().is_none());
    assert!(
        repo.get_page(Some("org-2"), "about", Some("en"))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.get_page(Some("org-1"), "about", Some("en"))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_sqlite_get_any_language() {
    let repo = setup_test_db().await;
    repo.save_page(&create_mock_page(None, "about", "en", 0))
        .await
        .unwrap();

    assert!(repo.get_page(None, "about", Some("fr")).await.unwrap().is_none());

    let any = repo.get_page(None, "about", None).await.unwrap().unwrap();
    assert_eq!(any.lang, "en");
}

#[tokio::test]
async fn test_sqlite_page_name_exists_ignores_language() {
    let repo = setup_test_db().await;
    repo.save_page(&create_mock_page(None, "about", "en", 0))
        .await
        .unwrap();

    assert!(repo.page_name_exists(None, "about").await.unwrap());
    assert!(!repo.page_name_exists(None, "contact").await.unwrap());
    assert!(!repo.page_name_exists(Some("org-1"), "about").await.unwrap());
}

// updating by id must leave `created` alone
#[tokio::test]
async fn test_sqlite_upsert_logic() {
    let repo = setup_test_db().await;

    let mut page = create_mock_page(None, "about", "en", 0);
    repo.save_page(&page).await.unwrap();

    page.content = Some("<h1>Updated</h1>".to_string());
    page.created = base_time() + Duration::days(3);
    repo.save_page(&page).await.unwrap();

    let retrieved = repo.get_page(None, "about", Some("en")).await.unwrap().unwrap();
    assert_eq!(retrieved.content.as_deref(), Some("<h1>Updated</h1>"));
    assert_eq!(retrieved.created, base_time());
}

// a second row for the same (scope, name, lang) is refused
#[tokio::test]
async fn test_sqlite_unique_scope_name_lang_constraint() {
    let repo = setup_test_db().await;

    repo.save_page(&create_mock_page(None, "about", "en", 0))
        .await
        .unwrap();

    let result = repo
        .save_page(&create_mock_page(None, "about", "en", 1))
        .await;
    let err = result.expect_err("Should fail due to unique constraint");
    assert!(err.downcast_ref::<DuplicatePage>().is_some());

    // other languages and scopes are fine
    repo.save_page(&create_mock_page(None, "about", "fr", 2))
        .await
        .unwrap();
    repo.save_page(&create_mock_page(Some("org-1"), "about", "en", 3))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sqlite_delete() {
    let repo = setup_test_db().await;
    let page = create_mock_page(None, "about", "en", 0);
    repo.save_page(&page).await.unwrap();

    repo.delete_page(&page.id).await.unwrap();

    let retrieved = repo.get_page(None, "about", None).await.unwrap();
    assert!(retrieved.is_none());
}

#[tokio::test]
async fn test_sqlite_list_filters() {
    let repo = setup_test_db().await;

    let mut public = create_mock_page(None, "public", "en", 0);
    public.private = false;
    let mut hidden = create_mock_page(None, "hidden", "en", 1);
    hidden.private = true;
    let mut post = create_mock_page(None, "post", "en", 2);
    post.page_type = "blog".to_string();
    post.private = false;
    let org_page = create_mock_page(Some("org-1"), "org-page", "en", 3);

    for page in [&public, &hidden, &post, &org_page] {
        repo.save_page(page).await.unwrap();
    }

    // site pages, newest first
    let all = repo.list_pages(&PageQuery::default()).await.unwrap();
    let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["post", "hidden", "public"]);

    let only_public = repo
        .list_pages(&PageQuery {
            private: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(only_public.iter().all(|p| !p.private));
    assert_eq!(only_public.len(), 2);

    let blogs = repo
        .list_pages(&PageQuery {
            page_type: Some("blog".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0].name, "post");

    let org = repo
        .list_pages(&PageQuery {
            group_id: Some("org-1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(org.len(), 1);
    assert_eq!(org[0].name, "org-page");
}

#[tokio::test]
async fn test_sqlite_list_orderings() {
    let repo = setup_test_db().await;

    let mut second = create_mock_page(None, "second", "en", 0);
    second.order = Some("2".to_string());
    second.publish_date = Some(base_time() - Duration::days(10));
    let mut first = create_mock_page(None, "first", "en", 1);
    first.order = Some("1".to_string());
    first.publish_date = Some(base_time() - Duration::days(1));
    let mut unordered = create_mock_page(None, "unordered", "en", 2);
    unordered.order = Some(String::new());

    for page in [&second, &first, &unordered] {
        repo.save_page(page).await.unwrap();
    }

    let by_order = repo
        .list_pages(&PageQuery {
            order: ListOrder::Order,
            ..Default::default()
        })
        .await
        .unwrap();
    let names: Vec<&str> = by_order.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);

    let by_date = repo
        .list_pages(&PageQuery {
            order: ListOrder::PublishDate,
            ..Default::default()
        })
        .await
        .unwrap();
    let names: Vec<&str> = by_date.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
}
