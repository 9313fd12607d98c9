use pretty_assertions::assert_eq;
use relay_query::MutationConfig;
use relay_query::MutationQuery;
use relay_query::QueryError;
use relay_query::mutation::MutationConfigKind;
use serde_json::json;

use super::fragment;
use super::mutation;
use super::schema;
use super::tracker;

const COMMENT_CREATE_FAT_QUERY: &str = r#"
    fragment CommentCreateFatQuery on CommentCreateResponsePayload {
      feedback {
        comments
        likers
      }
      comment
      feedbackCommentEdge {
        cursor
        node
        source
      }
    }
"#;

#[test]
fn builds_a_comment_create_query_from_json_configs() {
    let schema = schema();
    let fat_query = fragment(&schema, COMMENT_CREATE_FAT_QUERY);
    let tracker = tracker(&schema, &["feedback:1"], r#"
        fragment Seen on Feedback {
          likers { count }
          comments(orderby: "toplevel", first: 10) {
            count
            edges { cursor node { id body { text } } }
            pageInfo { hasNextPage }
          }
        }
    "#);
    let configs = MutationConfig::from_json_list(
        &json!([
            {
                "type": "RANGE_ADD",
                "parentName": "feedback",
                "parentID": "feedback:1",
                "connectionName": "comments",
                "edgeName": "feedbackCommentEdge",
                "rangeBehaviors": { "orderby(toplevel)": "append" },
            },
            {
                "type": "REQUIRED_CHILDREN",
                "children": ["fragment Required on CommentCreateResponsePayload { comment { id } }"],
            },
        ]),
        "CommentCreateMutation",
        &schema,
    )
    .unwrap();
    let query = MutationQuery::new(&fat_query, &tracker)
        .build_query(&configs, "CommentCreateMutation", &mutation(&schema, "commentCreate"))
        .unwrap();
    insta::assert_snapshot!(query, @r###"
    mutation CommentCreateMutation {
      commentCreate(input: $input) {
        clientMutationId
        feedbackCommentEdge {
          cursor
          __typename
          source {
            id
            __typename
          }
          node {
            id
            body {
              text
            }
          }
        }
        feedback {
          likers {
            count
          }
          comments(orderby: "toplevel", first: 10) {
            count
          }
          id
        }
        comment {
          id
        }
      }
    }
    "###);
}

#[test]
fn builds_an_unfriend_query_from_json_configs() {
    let schema = schema();
    let fat_query = fragment(&schema, r#"
        fragment UnfriendFatQuery on UnfriendResponsePayload {
          actor {
            friends
          }
          formerFriend
        }
    "#);
    let tracker = tracker(&schema, &["user:1"], r#"
        fragment Seen on User {
          name
          friends(first: 10) {
            count
            edges { node { name } }
          }
        }
    "#);
    let configs = MutationConfig::from_json_list(
        &json!([{
            "type": "RANGE_DELETE",
            "parentName": "actor",
            "parentID": "user:1",
            "connectionName": "friends",
            "deletedIDFieldName": ["formerFriend"],
        }]),
        "UnfriendMutation",
        &schema,
    )
    .unwrap();
    let query = MutationQuery::new(&fat_query, &tracker)
        .build_query(&configs, "UnfriendMutation", &mutation(&schema, "unfriend"))
        .unwrap();
    insta::assert_snapshot!(query, @r###"
    mutation UnfriendMutation {
      unfriend(input: $input) {
        clientMutationId
        formerFriend {
          id
        }
        actor {
          id
        }
      }
    }
    "###);
}

#[test]
fn builds_a_query_for_a_nested_connection_path() {
    let schema = schema();
    let fat_query = fragment(&schema, r#"
        fragment UnfriendFatQuery on UnfriendResponsePayload {
          viewer {
            actor {
              friends
              name
            }
          }
        }
    "#);
    let tracker = tracker(
        &schema,
        &["user:1"],
        "fragment Seen on User { name friends(first: 10) { count } }",
    );
    let configs = MutationConfig::from_json_list(
        &json!([{
            "type": "RANGE_DELETE",
            "parentID": "user:1",
            "connectionName": "friends",
            "deletedIDFieldName": ["formerFriend"],
            "pathToConnection": ["viewer", "actor", "friends"],
        }]),
        "UnfriendMutation",
        &schema,
    )
    .unwrap();
    let query = MutationQuery::new(&fat_query, &tracker)
        .build_query(&configs, "UnfriendMutation", &mutation(&schema, "unfriend"))
        .unwrap();
    insta::assert_snapshot!(query, @r###"
    mutation UnfriendMutation {
      unfriend(input: $input) {
        clientMutationId
        formerFriend {
          id
        }
        viewer {
          actor {
            name
            id
          }
        }
      }
    }
    "###);
}

#[test]
fn builds_a_seen_state_query_for_plural_ids() {
    let schema = schema();
    let fat_query = fragment(&schema, r#"
        fragment SeenStateFatQuery on ViewerNotificationsUpdateAllSeenStateResponsePayload {
          stories {
            seenState
          }
        }
    "#);
    let tracker = tracker(
        &schema,
        &["story:1", "story:2"],
        "fragment Seen on Story { seenState message { text } }",
    );
    let configs = MutationConfig::from_json_list(
        &json!([{ "type": "FIELDS_CHANGE", "fieldIDs": { "stories": ["story:1", "story:2"] } }]),
        "ViewerNotificationsUpdateAllSeenStateMutation",
        &schema,
    )
    .unwrap();
    let query = MutationQuery::new(&fat_query, &tracker)
        .build_query(
            &configs,
            "ViewerNotificationsUpdateAllSeenStateMutation",
            &mutation(&schema, "viewerNotificationsUpdateAllSeenState"),
        )
        .unwrap();
    insta::assert_snapshot!(query, @r###"
    mutation ViewerNotificationsUpdateAllSeenStateMutation {
      viewerNotificationsUpdateAllSeenState(input: $input) {
        clientMutationId
        stories {
          seenState
          id
        }
      }
    }
    "###);
}

#[test]
fn rejects_unknown_config_types() {
    let error = MutationConfig::from_json_list(
        &json!([
            { "type": "FIELDS_CHANGE", "fieldIDs": { "actor": "123" } },
            { "type": "COSMIC_RAY_BIT_FLIP" },
        ]),
        "UnfriendMutation",
        &schema(),
    )
    .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Unrecognized config key `COSMIC_RAY_BIT_FLIP` for `UnfriendMutation`."
    );
}

#[test]
fn rejects_configs_missing_fields() {
    let error = MutationConfig::from_json(
        &json!({ "type": "NODE_DELETE", "parentName": "feedback", "connectionName": "comments" }),
        "CommentDeleteMutation",
        &schema(),
    )
    .unwrap_err();
    assert!(
        matches!(
            &error,
            QueryError::InvalidConfig { kind, mutation_name, .. }
                if *kind == MutationConfigKind::NodeDelete.to_string()
                    && mutation_name == "CommentDeleteMutation"
        ),
        "unexpected error: {error:?}"
    );
}

#[test]
fn reports_fat_query_mismatches() {
    let schema = schema();
    let fat_query = fragment(&schema, COMMENT_CREATE_FAT_QUERY);
    let tracker = tracker(&schema, &[], "fragment Seen on Feedback { id }");
    let configs = MutationConfig::from_json_list(
        &json!([{
            "type": "NODE_DELETE",
            "parentName": "story",
            "parentID": "story:1",
            "connectionName": "comments",
            "deletedIDFieldName": "deletedCommentId",
        }]),
        "CommentDeleteMutation",
        &schema,
    )
    .unwrap();
    let error = MutationQuery::new(&fat_query, &tracker)
        .build_query(&configs, "CommentDeleteMutation", &mutation(&schema, "commentDelete"))
        .unwrap_err();
    assert_eq!(error.to_string(), "Invalid field name on fat query, `story`.");
}
