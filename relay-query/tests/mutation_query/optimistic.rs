use relay_query::query_for_optimistic_update;
use serde_json::json;

use super::fragment;
use super::mutation;
use super::schema;

#[test]
fn builds_an_optimistic_query_for_a_new_comment() {
    let schema = schema();
    let fat_query = fragment(&schema, r#"
        fragment CommentCreateFatQuery on CommentCreateResponsePayload {
          feedback { comments }
          feedbackCommentEdge { cursor node source }
        }
    "#);
    let response = json!({
        "feedback": {
            "id": "feedback:1",
            "comments": { "count": 2 },
        },
        "feedbackCommentEdge": {
            "__typename": "CommentsEdge",
            "node": {
                "body": { "text": "Hello!" },
            },
        },
    });
    let query =
        query_for_optimistic_update(&response, &fat_query, &mutation(&schema, "commentCreate"))
            .unwrap();
    insta::assert_snapshot!(query, @r###"
    mutation OptimisticQuery {
      commentCreate(input: $input) {
        clientMutationId
        feedback {
          id
          comments {
            count
          }
        }
        feedbackCommentEdge {
          __typename
          node {
            body {
              text
            }
            id
          }
        }
      }
    }
    "###);
}
