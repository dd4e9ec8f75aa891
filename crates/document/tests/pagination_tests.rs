//! Collection serving: filtering, sorting, paging and pagination links.

mod common;

use serde_json::json;
use tessera_document::{EngineConfig, PaginationInfo, build_collection_document};
use tessera_query::types::PageRequest;
use tessera_query::{Criteria, LimitKind, QueryError, WhitelistError};

use common::{blog_store, data_keys, engine, engine_with, numbered_articles};

fn page_param(url: &str, name: &str) -> u64 {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.parse().unwrap())
        .unwrap()
}

fn page_number(url: &str) -> u64 {
    page_param(url, "page[number]")
}

#[tokio::test]
async fn test_middle_page_links() {
    let document = engine(numbered_articles(13))
        .serve_query("articles", "page[number]=2&page[size]=5")
        .await
        .unwrap();

    assert_eq!(
        data_keys(&document),
        vec!["articles/6", "articles/7", "articles/8", "articles/9", "articles/10"]
    );
    assert_eq!(document.meta["total"], json!(13));

    let links = &document.links;
    assert_eq!(page_number(links.first.as_deref().unwrap()), 1);
    assert_eq!(page_number(links.prev.as_deref().unwrap()), 1);
    assert_eq!(page_number(links.next.as_deref().unwrap()), 3);
    assert_eq!(page_number(links.last.as_deref().unwrap()), 3);
    assert_eq!(page_number(links.self_link.as_deref().unwrap()), 2);
}

#[tokio::test]
async fn test_first_and_last_page_edges() {
    let engine = engine(numbered_articles(13));

    let first = engine
        .serve_query("articles", "page[size]=5")
        .await
        .unwrap();
    assert!(first.links.prev.is_none());
    assert_eq!(page_number(first.links.next.as_deref().unwrap()), 2);

    let last = engine
        .serve_query("articles", "page[number]=3&page[size]=5")
        .await
        .unwrap();
    assert_eq!(last.data.resources().len(), 3);
    assert!(last.links.next.is_none());
    assert_eq!(page_number(last.links.prev.as_deref().unwrap()), 2);
}

#[tokio::test]
async fn test_empty_collection_has_one_page() {
    let document = engine(numbered_articles(0))
        .serve_query("articles", "")
        .await
        .unwrap();
    assert!(document.data.resources().is_empty());
    assert_eq!(page_number(document.links.last.as_deref().unwrap()), 1);
    assert!(document.links.next.is_none());
    assert_eq!(document.to_json()["data"], json!([]));
}

#[tokio::test]
async fn test_links_keep_other_params_verbatim() {
    let document = engine(numbered_articles(13))
        .serve_query("articles", "sort=-views&page[number]=2&page[size]=3&fields[articles]=title")
        .await
        .unwrap();

    let next = document.links.next.clone().unwrap();
    let (path, query) = next.split_once('?').unwrap();
    assert_eq!(path, "http://localhost:8080/articles");
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("sort".to_string(), "-views".to_string()),
            ("page[number]".to_string(), "3".to_string()),
            ("page[size]".to_string(), "3".to_string()),
            ("fields[articles]".to_string(), "title".to_string()),
        ]
    );

    // Sorted by views descending: 13, 12, 11 then 10, 9, 8.
    assert_eq!(
        data_keys(&document),
        vec!["articles/10", "articles/9", "articles/8"]
    );
}

#[tokio::test]
async fn test_build_collection_from_loaded_page() {
    let store = blog_store();
    let engine = engine(store);
    let items = vec![
        tessera_document::Entity::new("articles", "1").with_attribute("title", "Rust"),
        tessera_document::Entity::new("articles", "2").with_attribute("title", "Tokio"),
    ];
    let criteria = Criteria::from_query("page[number]=1&page[size]=2", 10).unwrap();

    let document =
        build_collection_document(&engine, "articles", items, &criteria, PaginationInfo::new(3))
            .await
            .unwrap();
    assert_eq!(data_keys(&document), vec!["articles/1", "articles/2"]);
    assert_eq!(page_number(document.links.last.as_deref().unwrap()), 2);
    assert_eq!(document.meta["total"], json!(3));
}

#[tokio::test]
async fn test_links_for_code_built_criteria() {
    let engine = engine(numbered_articles(13));
    let criteria = Criteria::new().with_page(PageRequest::new(2, 5).unwrap());
    let items = (6..=10)
        .map(|i| tessera_document::Entity::new("articles", i.to_string()))
        .collect();

    let document =
        build_collection_document(&engine, "articles", items, &criteria, PaginationInfo::new(13))
            .await
            .unwrap();

    let links = &document.links;
    let next = links.next.as_deref().unwrap();
    assert_eq!(page_number(next), 3);
    assert_eq!(page_param(next, "page[size]"), 5);
    assert_eq!(page_number(links.self_link.as_deref().unwrap()), 2);
    assert_eq!(page_param(links.last.as_deref().unwrap(), "page[size]"), 5);

    // Following `next` serves the last three articles.
    let query = next.split_once('?').unwrap().1;
    let page3 = engine.serve_query("articles", query).await.unwrap();
    assert_eq!(
        data_keys(&page3),
        vec!["articles/11", "articles/12", "articles/13"]
    );
}

#[tokio::test]
async fn test_unlisted_filter_rejected() {
    let err = engine(blog_store())
        .serve_query("articles", "filter[title]=Rust")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        tessera_document::DocumentError::Query(QueryError::Whitelist(
            WhitelistError::FieldNotAllowed { .. }
        ))
    ));
}

#[tokio::test]
async fn test_page_size_limit() {
    let config = EngineConfig {
        page_max_size: 50,
        ..EngineConfig::for_testing()
    };
    let err = engine_with(config, numbered_articles(3))
        .serve_query("articles", "page[size]=51")
        .await
        .unwrap_err();
    let violation = err.as_limit_violation().unwrap();
    assert_eq!(violation.kind, LimitKind::PageSize);
    assert_eq!(violation.observed, 51);
    assert_eq!(violation.threshold, 50);
}

#[tokio::test]
async fn test_invalid_page_number() {
    let err = engine(numbered_articles(3))
        .serve_query("articles", "page[number]=0")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        tessera_document::DocumentError::Query(QueryError::InvalidParameter { ref name, .. })
            if name == "page[number]"
    ));
}
