//! Bitbucket Cloud (api.bitbucket.org/2.0) 백엔드.

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::application::ports::PrGateway;
use crate::domain::error::Error;
use crate::domain::pr::{CommentDraft, ExistingComment, PrState, PullRequestRef, to_posix_path};
use crate::infrastructure::http::ApiTransport;

use super::request;

pub struct CloudBackend {
    client: Client,
    transport: ApiTransport,
    api_base: String,
    workspace: String,
    repo: String,
    credential: Option<String>,
}

impl CloudBackend {
    pub fn new(
        api_base: String,
        workspace: String,
        repo: String,
        credential: Option<String>,
        transport: ApiTransport,
    ) -> Self {
        Self {
            client: Client::new(),
            transport,
            api_base,
            workspace,
            repo,
            credential,
        }
    }

    fn pullrequests_endpoint(&self) -> String {
        format!(
            "{}/repositories/{}/{}/pullrequests",
            self.api_base, self.workspace, self.repo
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T, Error> {
        let response = self
            .transport
            .execute(request(
                &self.client,
                Method::GET,
                url,
                self.credential.as_deref(),
            ))
            .await?;
        response
            .json()
            .await
            .map_err(|err| Error::ParseAnomaly(format!("malformed Cloud response: {err}")))
    }
}

/// q 필터의 따옴표 문자열 안에 들어갈 값을 이스케이프한다.
/// git ref 이름에는 `"`가 합법적으로 들어갈 수 있다.
fn quote_filter_value(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}

#[derive(Debug, Deserialize)]
struct PrPage {
    #[serde(default)]
    values: Vec<PrResource>,
}

#[derive(Debug, Deserialize)]
struct PrResource {
    id: u64,
    state: Option<String>,
    source: Option<BranchSide>,
    destination: Option<BranchSide>,
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct BranchSide {
    branch: Option<BranchName>,
}

#[derive(Debug, Deserialize)]
struct BranchName {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Links {
    html: Option<Href>,
}

#[derive(Debug, Deserialize)]
struct Href {
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentPage {
    #[serde(default)]
    values: Vec<CommentResource>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentResource {
    content: Option<CommentContent>,
    inline: Option<InlineAnchor>,
}

#[derive(Debug, Deserialize)]
struct CommentContent {
    raw: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InlineAnchor {
    path: Option<String>,
    to: Option<u32>,
}

impl PrResource {
    fn into_ref(self) -> PullRequestRef {
        let branch_of = |side: Option<BranchSide>| {
            side.and_then(|s| s.branch)
                .and_then(|b| b.name)
                .unwrap_or_default()
        };
        PullRequestRef {
            id: self.id,
            state: PrState::from_api(self.state.as_deref()),
            source_branch: branch_of(self.source),
            target_branch: branch_of(self.destination),
            web_url: self
                .links
                .and_then(|l| l.html)
                .and_then(|h| h.href)
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PrGateway for CloudBackend {
    async fn find_pr(&self, source: &str, target: &str) -> Result<Option<PullRequestRef>, Error> {
        // 구조화된 q 필터로 서버 측에서 브랜치 쌍을 거른다.
        let source = quote_filter_value(source);
        let target = quote_filter_value(target);
        let filter = format!(
            r#"source.branch.name="{source}" AND state="OPEN" AND destination.branch.name="{target}""#
        );
        let url = format!(
            "{}?q={}",
            self.pullrequests_endpoint(),
            utf8_percent_encode(&filter, NON_ALPHANUMERIC)
        );

        let page: PrPage = self.get_json(url).await?;
        Ok(page.values.into_iter().next().map(PrResource::into_ref))
    }

    async fn create_pr(
        &self,
        source: &str,
        target: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<PullRequestRef, Error> {
        let payload = json!({
            "title": title.unwrap_or(source),
            "description": description.unwrap_or(""),
            "source": {"branch": {"name": source}},
            "destination": {"branch": {"name": target}},
            "close_source_branch": false,
        });

        let response = self
            .transport
            .execute(
                request(
                    &self.client,
                    Method::POST,
                    self.pullrequests_endpoint(),
                    self.credential.as_deref(),
                )
                .json(&payload),
            )
            .await?;

        let created: PrResource = response
            .json()
            .await
            .map_err(|err| Error::ParseAnomaly(format!("malformed create response: {err}")))?;
        Ok(created.into_ref())
    }

    async fn fetch_diff(&self, pr_id: u64) -> Result<String, Error> {
        let url = format!("{}/{pr_id}/diff", self.pullrequests_endpoint());
        let response = self
            .transport
            .execute(
                request(&self.client, Method::GET, url, self.credential.as_deref())
                    .header("Accept", "text/plain"),
            )
            .await?;
        response
            .text()
            .await
            .map_err(|err| Error::Transport(err.to_string()))
    }

    async fn list_comments(&self, pr_id: u64) -> Result<Vec<ExistingComment>, Error> {
        let mut url = format!("{}/{pr_id}/comments?pagelen=100", self.pullrequests_endpoint());
        let mut out = Vec::new();

        // Cloud는 다음 페이지의 절대 URL을 응답에 넣어 준다.
        loop {
            let page: CommentPage = self.get_json(url).await?;
            for record in page.values {
                out.push(ExistingComment {
                    path: record
                        .inline
                        .as_ref()
                        .and_then(|a| a.path.as_deref())
                        .map(to_posix_path),
                    line: record.inline.as_ref().and_then(|a| a.to),
                    text: record.content.and_then(|c| c.raw).unwrap_or_default(),
                });
            }
            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(out)
    }

    async fn post_comment(&self, pr_id: u64, draft: &CommentDraft) -> Result<(), Error> {
        let mut payload = json!({"content": {"raw": draft.body}});
        if let Some(path) = &draft.target_path {
            let mut inline = json!({"path": to_posix_path(path)});
            if let Some(line) = draft.anchor_line {
                inline["to"] = Value::from(line);
            }
            payload["inline"] = inline;
        }

        let url = format!("{}/{pr_id}/comments", self.pullrequests_endpoint());
        self.transport
            .execute(
                request(&self.client, Method::POST, url, self.credential.as_deref())
                    .json(&payload),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn backend(server: &mockito::Server) -> CloudBackend {
        CloudBackend::new(
            server.url(),
            "acme".to_string(),
            "widgets".to_string(),
            Some("dG9rZW4=".to_string()),
            ApiTransport::new(0, 0),
        )
    }

    #[tokio::test]
    async fn find_pr_sends_encoded_branch_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repositories/acme/widgets/pullrequests")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                r#"source.branch.name="feature/x" AND state="OPEN" AND destination.branch.name="main""#.into(),
            ))
            .match_header("Authorization", "Basic dG9rZW4=")
            .with_body(
                r#"{"values": [{"id": 7, "state": "OPEN",
                    "source": {"branch": {"name": "feature/x"}},
                    "destination": {"branch": {"name": "main"}},
                    "links": {"html": {"href": "https://bitbucket.org/acme/widgets/pull-requests/7"}}}]}"#,
            )
            .create_async()
            .await;

        let pr = backend(&server).find_pr("feature/x", "main").await.unwrap().unwrap();
        assert_eq!(pr.id, 7);
        assert_eq!(pr.state, PrState::Open);
        assert_eq!(pr.source_branch, "feature/x");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn branch_names_with_quotes_are_escaped_in_the_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repositories/acme/widgets/pullrequests")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                r#"source.branch.name="fea\"ture" AND state="OPEN" AND destination.branch.name="main""#.into(),
            ))
            .with_body(r#"{"values": []}"#)
            .create_async()
            .await;

        let pr = backend(&server).find_pr(r#"fea"ture"#, "main").await.unwrap();
        assert!(pr.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn find_pr_with_no_values_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repositories/acme/widgets/pullrequests")
            .match_query(Matcher::Any)
            .with_body(r#"{"values": []}"#)
            .create_async()
            .await;

        let pr = backend(&server).find_pr("feature/x", "main").await.unwrap();
        assert!(pr.is_none());
    }

    #[tokio::test]
    async fn inline_comment_payload_uses_content_raw_and_inline_anchor() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories/acme/widgets/pullrequests/7/comments")
            .match_body(Matcher::Json(serde_json::json!({
                "content": {"raw": "needs a null check"},
                "inline": {"path": "src/app.py", "to": 25},
            })))
            .with_body("{}")
            .create_async()
            .await;

        let draft = CommentDraft::inline("src\\app.py", 25, "needs a null check");
        backend(&server).post_comment(7, &draft).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn comment_listing_follows_next_links() {
        let mut server = mockito::Server::new_async().await;
        let second_url = format!("{}/page2", server.url());
        server
            .mock("GET", "/repositories/acme/widgets/pullrequests/7/comments")
            .match_query(Matcher::UrlEncoded("pagelen".into(), "100".into()))
            .with_body(format!(
                r#"{{"values": [{{"content": {{"raw": "first"}}}}], "next": "{second_url}"}}"#
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/page2")
            .with_body(
                r#"{"values": [{"content": {"raw": "second"},
                    "inline": {"path": "src/app.py", "to": 3}}]}"#,
            )
            .create_async()
            .await;

        let comments = backend(&server).list_comments(7).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "first");
        assert_eq!(comments[1].path.as_deref(), Some("src/app.py"));
        assert_eq!(comments[1].line, Some(3));
    }
}
