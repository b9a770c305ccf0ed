//! Bitbucket Server / Data Center (rest/api/1.0) 백엔드.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::application::ports::PrGateway;
use crate::domain::error::Error;
use crate::domain::pr::{CommentDraft, ExistingComment, PrState, PullRequestRef, to_posix_path};
use crate::infrastructure::http::ApiTransport;

use super::{request, unwrap_json_diff};

const SEARCH_PAGE_LIMIT: u32 = 25;

pub struct ServerBackend {
    client: Client,
    transport: ApiTransport,
    api_base: String,
    project: String,
    repo: String,
    credential: Option<String>,
}

impl ServerBackend {
    pub fn new(
        api_base: String,
        project: String,
        repo: String,
        credential: Option<String>,
        transport: ApiTransport,
    ) -> Self {
        Self {
            client: Client::new(),
            transport,
            api_base,
            project,
            repo,
            credential,
        }
    }

    fn pull_requests_endpoint(&self) -> String {
        format!(
            "{}/projects/{}/repos/{}/pull-requests",
            self.api_base, self.project, self.repo
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let response = self
            .transport
            .execute(
                request(&self.client, Method::GET, url, self.credential.as_deref())
                    .query(query),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|err| Error::ParseAnomaly(format!("malformed Server response: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct PrPage {
    #[serde(default)]
    values: Vec<PrResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrResource {
    id: u64,
    state: Option<String>,
    from_ref: Option<RefSide>,
    to_ref: Option<RefSide>,
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefSide {
    display_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Links {
    #[serde(rename = "self", default)]
    self_links: Vec<Href>,
}

#[derive(Debug, Deserialize)]
struct Href {
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityPage {
    #[serde(default)]
    values: Vec<ActivityResource>,
    is_last_page: Option<bool>,
    next_page_start: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityResource {
    action: Option<String>,
    comment: Option<CommentResource>,
    comment_anchor: Option<CommentAnchor>,
}

#[derive(Debug, Deserialize)]
struct CommentResource {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentAnchor {
    path: Option<String>,
    line: Option<u32>,
}

impl PrResource {
    fn into_ref(self) -> PullRequestRef {
        let display_of =
            |side: Option<RefSide>| side.and_then(|r| r.display_id).unwrap_or_default();
        PullRequestRef {
            id: self.id,
            state: PrState::from_api(self.state.as_deref()),
            source_branch: display_of(self.from_ref),
            target_branch: display_of(self.to_ref),
            web_url: self
                .links
                .and_then(|l| l.self_links.into_iter().next())
                .and_then(|h| h.href)
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PrGateway for ServerBackend {
    async fn find_pr(&self, source: &str, target: &str) -> Result<Option<PullRequestRef>, Error> {
        // Server 검색 API는 브랜치 쌍 필터가 없어 source 기준으로 조회한 뒤
        // displayId를 로컬에서 비교한다.
        let query = [
            ("at", format!("refs/heads/{source}")),
            ("state", "OPEN".to_string()),
            ("limit", SEARCH_PAGE_LIMIT.to_string()),
        ];
        let page: PrPage = self.get_json(self.pull_requests_endpoint(), &query).await?;

        let matched = page.values.into_iter().map(PrResource::into_ref).find(|pr| {
            pr.source_branch == source && pr.target_branch == target
        });
        Ok(matched)
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
            "fromRef": {"id": format!("refs/heads/{source}")},
            "toRef": {"id": format!("refs/heads/{target}")},
        });

        let response = self
            .transport
            .execute(
                request(
                    &self.client,
                    Method::POST,
                    self.pull_requests_endpoint(),
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
        let url = format!("{}/{pr_id}/diff", self.pull_requests_endpoint());
        let response = self
            .transport
            .execute(
                request(&self.client, Method::GET, url, self.credential.as_deref())
                    .header("Accept", "text/plain"),
            )
            .await?;
        let body = response
            .text()
            .await
            .map_err(|err| Error::Transport(err.to_string()))?;
        // 일부 배포본은 text/plain을 무시하고 JSON으로 감싼다.
        Ok(unwrap_json_diff(&body))
    }

    async fn list_comments(&self, pr_id: u64) -> Result<Vec<ExistingComment>, Error> {
        let url = format!("{}/{pr_id}/activities", self.pull_requests_endpoint());
        let mut start: u64 = 0;
        let mut out = Vec::new();

        loop {
            let query = [("start", start.to_string())];
            let page: ActivityPage = self.get_json(url.clone(), &query).await?;

            for record in page.values {
                if record.action.as_deref() != Some("COMMENTED") {
                    continue;
                }
                let Some(comment) = record.comment else {
                    continue;
                };
                out.push(ExistingComment {
                    path: record
                        .comment_anchor
                        .as_ref()
                        .and_then(|a| a.path.as_deref())
                        .map(to_posix_path),
                    line: record.comment_anchor.as_ref().and_then(|a| a.line),
                    text: comment.text.unwrap_or_default(),
                });
            }

            if page.is_last_page.unwrap_or(true) {
                break;
            }
            match page.next_page_start {
                Some(next) => start = next,
                None => break,
            }
        }

        Ok(out)
    }

    async fn post_comment(&self, pr_id: u64, draft: &CommentDraft) -> Result<(), Error> {
        let mut payload = json!({"text": draft.body});
        if let Some(path) = &draft.target_path {
            let mut anchor = json!({
                "path": to_posix_path(path),
                "lineType": "ADDED",
                "fileType": "TO",
            });
            if let Some(line) = draft.anchor_line {
                anchor["line"] = Value::from(line);
            }
            payload["anchor"] = anchor;
        }

        let url = format!("{}/{pr_id}/comments", self.pull_requests_endpoint());
        self.transport
            .execute(
                request(&self.client, Method::POST, url, self.credential.as_deref())
                    .json(&payload),
            )
            .await?;
        Ok(())
    }
}
