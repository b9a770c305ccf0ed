//! 공유 HTTP 실행 계층. 재시도 정책과 분당 요청 상한을 한곳에서 적용한다.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::{Instant, sleep, sleep_until};

use crate::domain::error::Error;

const RATE_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// 프로세스 내부 rolling window 카운터. limit 0은 비활성화.
pub struct RateLimiter {
    limit: u32,
    recent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limit: limit_per_minute,
            recent: Mutex::new(VecDeque::new()),
        }
    }

    /// 상한에 도달했으면 가장 오래된 요청이 window를 벗어날 때까지 기다린다.
    pub async fn acquire(&self) {
        if self.limit == 0 {
            return;
        }

        loop {
            let wait_until = {
                let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
                let now = Instant::now();
                while let Some(front) = recent.front()
                    && now.duration_since(*front) >= RATE_WINDOW
                {
                    recent.pop_front();
                }

                if (recent.len() as u32) < self.limit {
                    recent.push_back(now);
                    None
                } else {
                    recent.front().map(|front| *front + RATE_WINDOW)
                }
            };

            match wait_until {
                None => return,
                Some(deadline) => {
                    tracing::debug!("request rate limit reached; waiting for window");
                    sleep_until(deadline).await;
                }
            }
        }
    }
}

/// 요청 한 건을 재시도 정책과 함께 실행하는 전송 계층.
///
/// - 401: 즉시 Authentication 오류(호출부가 저장된 자격 증명을 지운다)
/// - 429: Retry-After(기본 2초)만큼 대기 후 재시도, 예산 소진 시 RateLimited
/// - 5xx/전송 오류: 시도 횟수에 비례한 선형 백오프로 재시도
/// - 그 외 4xx: 상태/본문을 담은 Remote 오류
pub struct ApiTransport {
    max_retries: u32,
    limiter: RateLimiter,
}

impl ApiTransport {
    pub fn new(max_retries: u32, rate_limit_per_minute: u32) -> Self {
        Self {
            max_retries,
            limiter: RateLimiter::new(rate_limit_per_minute),
        }
    }

    pub async fn execute(&self, request: RequestBuilder) -> Result<Response, Error> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.limiter.acquire().await;

            // 재시도마다 같은 요청을 다시 보내야 하므로 복제 가능한 본문만 허용한다.
            let prepared = request
                .try_clone()
                .ok_or_else(|| Error::Transport("request body is not retryable".to_string()))?;

            let response = match prepared.send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt > self.max_retries {
                        return Err(Error::Transport(err.to_string()));
                    }
                    let backoff = Duration::from_secs(attempt as u64);
                    tracing::warn!(attempt, "transport error, retrying in {backoff:?}: {err}");
                    sleep(backoff).await;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED {
                let body = body_text(response).await;
                tracing::warn!("authentication rejected by remote");
                return Err(Error::Authentication(body));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after_secs(&response).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                let body = body_text(response).await;
                if attempt > self.max_retries {
                    return Err(Error::RateLimited {
                        attempts: attempt,
                        body,
                    });
                }
                tracing::warn!(attempt, "rate limited by remote, retrying in {wait}s");
                sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if status.is_server_error() {
                let body = body_text(response).await;
                if attempt > self.max_retries {
                    return Err(Error::Remote {
                        status: status.as_u16(),
                        body,
                    });
                }
                let backoff = Duration::from_secs(attempt as u64);
                tracing::warn!(attempt, %status, "server error, retrying in {backoff:?}");
                sleep(backoff).await;
                continue;
            }

            return Err(Error::Remote {
                status: status.as_u16(),
                body: body_text(response).await,
            });
        }
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

async fn body_text(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 같은 URL로 오는 연속 요청에 고정된 응답열을 돌려주는 1회용 서버.
    /// 재시도는 동일 요청의 반복이라 응답을 순서로 구분해야 한다.
    async fn serve_in_sequence(responses: &'static [&'static str]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
            }
        });
        addr
    }

    #[tokio::test]
    async fn rate_limited_request_retries_after_hint_then_succeeds() {
        let addr = serve_in_sequence(&[
            "HTTP/1.1 429 Too Many Requests\r\nRetry-After: 1\r\nContent-Length: 9\r\nConnection: close\r\n\r\nslow down",
            "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\ndone",
        ])
        .await;

        let transport = ApiTransport::new(3, 0);
        let client = reqwest::Client::new();
        let started = std::time::Instant::now();

        let response = transport
            .execute(client.get(format!("http://{addr}/thing")))
            .await
            .unwrap();

        let elapsed = started.elapsed();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "done");
        assert!(elapsed >= Duration::from_secs(1), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "waited {elapsed:?}");
    }

    #[tokio::test]
    async fn server_error_backs_off_then_succeeds() {
        let addr = serve_in_sequence(&[
            "HTTP/1.1 502 Bad Gateway\r\nContent-Length: 4\r\nConnection: close\r\n\r\ndown",
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        ])
        .await;

        let transport = ApiTransport::new(2, 0);
        let client = reqwest::Client::new();

        let response = transport
            .execute(client.get(format!("http://{addr}/thing")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unauthorized_fails_immediately_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let denied = server
            .mock("GET", "/secret")
            .with_status(401)
            .with_body("bad credentials")
            .expect(1)
            .create_async()
            .await;

        let transport = ApiTransport::new(3, 0);
        let client = reqwest::Client::new();

        let err = transport
            .execute(client.get(format!("{}/secret", server.url())))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        denied.assert_async().await;
    }

    #[tokio::test]
    async fn exhausted_rate_limit_budget_surfaces_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let throttled = server
            .mock("GET", "/thing")
            .with_status(429)
            .with_header("Retry-After", "0")
            .with_body("still busy")
            .create_async()
            .await;

        let transport = ApiTransport::new(1, 0);
        let client = reqwest::Client::new();

        let err = transport
            .execute(client.get(format!("{}/thing", server.url())))
            .await
            .unwrap_err();

        match err {
            Error::RateLimited { attempts, body } => {
                assert_eq!(attempts, 2);
                assert_eq!(body, "still busy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        drop(throttled);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/thing")
            .with_status(404)
            .with_body("nope")
            .expect(1)
            .create_async()
            .await;

        let transport = ApiTransport::new(3, 0);
        let client = reqwest::Client::new();

        let err = transport
            .execute(client.get(format!("{}/thing", server.url())))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Remote { status: 404, .. }));
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn limiter_with_zero_limit_never_blocks() {
        let limiter = RateLimiter::new(0);
        for _ in 0..100 {
            limiter.acquire().await;
        }
    }

    #[tokio::test]
    async fn limiter_gates_requests_past_the_window_limit() {
        let limiter = RateLimiter::new(2);
        limiter.acquire().await;
        limiter.acquire().await;

        // 세 번째 요청은 가장 오래된 요청이 60초 window를 벗어날 때까지 대기한다.
        let gated =
            tokio::time::timeout(Duration::from_millis(200), limiter.acquire()).await;
        assert!(gated.is_err(), "third acquire should wait for the window");
    }
}
