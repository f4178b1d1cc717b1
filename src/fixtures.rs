use serde_json::json;

use crate::{
    engine::{InMemoryEngine, MemoryStore},
    graph::{ResourceGraph, ResourceType, ValueType},
};

pub fn blog_graph() -> ResourceGraph {
    ResourceGraph::builder()
        .add(
            ResourceType::new("people", "Person")
                .attribute("name", ValueType::String)
                .nullable_attribute("email", ValueType::String)
                .to_many("articles", "articles")
                .to_one("manager", "people"),
        )
        .add(
            ResourceType::new("articles", "Article")
                .attribute("title", ValueType::String)
                .nullable_attribute("caption", ValueType::String)
                .attribute("createdAt", ValueType::DateTime)
                .attribute("wordCount", ValueType::Int)
                .nullable_attribute("rating", ValueType::Float)
                .attribute("isFeatured", ValueType::Bool)
                .to_one("author", "people")
                .to_one("reviewer", "people")
                .to_many("revisions", "revisions")
                .to_many("tags", "tags"),
        )
        .add(
            ResourceType::new("revisions", "Revision")
                .attribute("title", ValueType::String)
                .attribute("isPublished", ValueType::Bool)
                .attribute("createdAt", ValueType::DateTime)
                .to_one("author", "people"),
        )
        .add(
            ResourceType::new("tags", "Tag")
                .attribute("name", ValueType::String)
                .nullable_attribute("color", ValueType::String),
        )
        .add(
            ResourceType::new("contentItems", "ContentItem")
                .attribute("title", ValueType::String)
                .to_one("owner", "people"),
        )
        .add(
            ResourceType::new("blogs", "Blog")
                .derives_from("contentItems")
                .attribute("url", ValueType::String)
                .to_many("posts", "articles"),
        )
        .add(
            ResourceType::new("videos", "Video")
                .derives_from("contentItems")
                .attribute("url", ValueType::String)
                .attribute("durationSeconds", ValueType::Int),
        )
        .build()
        .expect("fixture graph is valid")
}

pub fn blog_engine(graph: &ResourceGraph) -> InMemoryEngine<'_> {
    let ann = json!({ "id": 1, "name": "Ann", "email": "ann@example.com", "manager": null });
    let bob = json!({ "id": 2, "name": "Bob", "email": null, "manager": ann });
    let cy = json!({ "id": 3, "name": "Cy", "manager": bob });
    let rust = json!({ "id": 1, "name": "rust", "color": "orange" });
    let memory = json!({ "id": 2, "name": "memory", "color": null });

    let articles = json!([
        {
            "id": 1, "title": "Rust ownership", "caption": "intro", "createdAt": "2024-03-01T10:00:00Z",
            "wordCount": 1200, "rating": 4.5, "isFeatured": true,
            "author": ann, "reviewer": bob,
            "revisions": [
                { "id": 10, "title": "draft", "isPublished": false, "createdAt": "2024-02-20T09:00:00Z", "author": ann },
                { "id": 11, "title": "first", "isPublished": true, "createdAt": "2024-02-25T09:00:00Z", "author": ann },
                { "id": 12, "title": "second", "isPublished": true, "createdAt": "2024-02-27T09:00:00Z", "author": bob },
                { "id": 13, "title": "third", "isPublished": true, "createdAt": "2024-02-28T09:00:00Z", "author": ann },
                { "id": 14, "title": "fourth", "isPublished": true, "createdAt": "2024-03-01T09:00:00Z", "author": ann }
            ],
            "tags": [rust, memory]
        },
        {
            "id": 2, "title": "Async in practice", "caption": null, "createdAt": "2024-05-01T12:00:00Z",
            "wordCount": 800, "rating": null, "isFeatured": false,
            "author": bob, "reviewer": null,
            "revisions": [
                { "id": 20, "title": "only", "isPublished": true, "createdAt": "2024-04-30T08:00:00Z", "author": bob }
            ],
            "tags": [rust]
        },
        {
            "id": 3, "title": "Gardening", "caption": "outdoors", "createdAt": "2023-11-11T07:30:00Z",
            "wordCount": 300, "rating": 3, "isFeatured": false,
            "author": cy, "reviewer": ann,
            "revisions": [],
            "tags": []
        }
    ]);

    let document = json!({
        "people": [ann, bob, cy],
        "tags": [rust, memory],
        "articles": articles.clone(),
        "contentItems": [{ "id": 1, "title": "Plain item", "owner": ann }],
        "blogs": [{ "id": 2, "title": "Dev blog", "url": "https://blog.dev", "owner": bob, "posts": [articles[1].clone()] }],
        "videos": [{ "id": 3, "title": "Conference talk", "url": "https://video.example", "durationSeconds": 1800, "owner": null }]
    });

    let engine = InMemoryEngine::new(graph);
    engine.load_json(&document.to_string()).expect("fixture data is valid");
    engine
}

pub fn blog_store(graph: &ResourceGraph) -> MemoryStore {
    blog_engine(graph).into_store()
}
