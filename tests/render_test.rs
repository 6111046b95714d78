//! Integration tests for rendering messages to HTML and PDF

mod test_utils;

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    use mailprint::core::Error;
    use mailprint::mail::{Attachment, Blob, Renderable};
    use mailprint::render::document::avatar_url;
    use mailprint::render::templates::PAGE_BREAK;
    use mailprint::render::{DocumentAssembler, ImageEmbedder, RenderOptions, data_uri};

    use crate::test_utils::{FakeFetcher, FakeRenderer, PNG, message, thread};

    fn body_only() -> RenderOptions {
        RenderOptions {
            include_header: false,
            embed_avatar: false,
            ..Default::default()
        }
    }

    fn html(blob: &Blob) -> String {
        String::from_utf8(blob.bytes.clone()).unwrap()
    }

    /// Tests every reachable remote image becomes a data URI in order
    #[tokio::test]
    async fn it_embeds_remote_images() {
        let fetcher = FakeFetcher::default()
            .with_image("http://img.example.com/1.png")
            .with("http://img.example.com/2.gif", 200, "image/gif", b"GIF89a22");
        let assembler = DocumentAssembler::new(&fetcher).unwrap();

        let mut msg = message("m1", "Pictures");
        msg.body = concat!(
            r#"<p><img src="http://img.example.com/1.png">"#,
            r#"<img alt="two" src='http://img.example.com/2.gif'></p>"#
        )
        .to_string();

        let blob = assembler
            .message_to_html(&[Renderable::from(&msg)], &body_only())
            .await
            .unwrap();
        let actual = html(&blob);

        let expected = format!(
            r#"<p><img src="{}"><img alt="two" src='{}'></p>"#,
            data_uri("image/png", PNG),
            data_uri("image/gif", b"GIF89a22")
        );
        assert!(actual.contains(&expected));
        assert!(!actual.contains("http://img.example.com"));
    }

    /// Tests failed or non-image responses keep the original reference
    #[tokio::test]
    async fn it_keeps_unreachable_images() {
        let fetcher = FakeFetcher::default()
            .with("http://img.example.com/gone.png", 404, "text/html", b"Not found")
            .with("http://img.example.com/page", 200, "text/html", b"<html></html>");
        let assembler = DocumentAssembler::new(&fetcher).unwrap();

        let mut msg = message("m1", "Broken");
        msg.body = concat!(
            r#"<img src="http://img.example.com/gone.png">"#,
            r#"<img src="http://img.example.com/page">"#,
            r#"<img src="http://unknown.example.com/x.png">"#
        )
        .to_string();

        let blob = assembler
            .message_to_html(&[(&msg).into()], &body_only())
            .await
            .unwrap();
        let actual = html(&blob);

        assert!(actual.contains(&msg.body));
        assert!(!actual.contains("data:"));
    }

    /// Tests a URL referenced many times is only fetched once
    #[tokio::test]
    async fn it_fetches_each_url_once() {
        let fetcher = FakeFetcher::default().with_image("https://img.example.com/logo.png");
        let mut embedder = ImageEmbedder::new(&fetcher);

        let input = concat!(
            r#"<img src="https://img.example.com/logo.png">"#,
            r#"<div style="background:url('https://img.example.com/logo.png')"></div>"#,
            r#"<style>td { background: url(https://img.example.com/logo.png) }</style>"#
        );
        let actual = embedder.embed_html_images(input).await;

        assert_eq!(fetcher.requests().len(), 1);
        assert_eq!(actual.matches(&data_uri("image/png", PNG)).count(), 3);

        // Embedding again leaves the document unchanged
        assert_eq!(embedder.embed_html_images(&actual).await, actual);
    }

    /// Tests cid references are replaced with decoded inline parts
    #[tokio::test]
    async fn it_embeds_inline_images() {
        let fetcher = FakeFetcher::default();
        let assembler = DocumentAssembler::new(&fetcher).unwrap();

        let gif = b"GIF89ainline".to_vec();
        let (png_b64, gif_b64) = (STANDARD.encode(PNG), STANDARD.encode(&gif));
        let mut msg = message("m1", "Inline");
        msg.body = r#"<img src="cid:logo@example"><img src="cid:photo@example">"#.to_string();
        msg.raw = [
            "Content-Type: multipart/related; boundary=\"b1\"",
            "",
            "--b1",
            "Content-Type: text/html",
            "",
            "<img src=3D\"cid:logo@example\"><img src=3D\"cid:photo@example\">",
            "--b1",
            "Content-Type: image/png",
            "Content-ID: <logo@example>",
            "Content-Transfer-Encoding: base64",
            "",
            png_b64.as_str(),
            "--b1",
            "Content-Type: image/gif",
            "Content-ID: <photo@example>",
            "Content-Transfer-Encoding: base64",
            "",
            gif_b64.as_str(),
            "--b1--",
            "",
        ]
        .join("\r\n");

        let blob = assembler
            .message_to_html(&[(&msg).into()], &body_only())
            .await
            .unwrap();
        let actual = html(&blob);

        let expected = format!(
            r#"<img src="{}"><img src="{}">"#,
            data_uri("image/png", PNG),
            data_uri("image/gif", &gif)
        );
        assert!(actual.contains(&expected));
        assert!(fetcher.requests().is_empty());
    }

    /// Tests each message after the first starts a new page
    #[tokio::test]
    async fn it_separates_messages_with_page_breaks() {
        let fetcher = FakeFetcher::default();
        let assembler = DocumentAssembler::new(&fetcher).unwrap();
        let t = thread(
            "t1",
            vec![
                message("m1", "First"),
                message("m2", "Second"),
                message("m3", "Third"),
            ],
        );

        let blob = assembler
            .message_to_html(&[(&t).into()], &RenderOptions::default())
            .await
            .unwrap();
        let actual = html(&blob);

        assert_eq!(actual.matches(PAGE_BREAK).count(), 2);
        let first = actual.find("<p>First</p>").unwrap();
        let second = actual.find("<p>Second</p>").unwrap();
        let third = actual.find("<p>Third</p>").unwrap();
        assert!(first < second && second < third);
        assert_eq!(blob.name, "Third.html");
        assert!(actual.contains("<title>Third</title>"));
    }

    /// Tests the header lists sender, subject, date and recipients
    #[tokio::test]
    async fn it_renders_the_message_header() {
        let fetcher = FakeFetcher::default().with_image(&avatar_url("alice@example.com"));
        let assembler = DocumentAssembler::new(&fetcher).unwrap();
        let mut msg = message("m1", "Lunch & Learn");
        msg.cc = "Carol <carol@example.com>".to_string();

        let blob = assembler
            .message_to_html(&[(&msg).into()], &RenderOptions::default())
            .await
            .unwrap();
        let actual = html(&blob);

        assert!(actual.contains(
            r#"<dd>Alice <a href="mailto:alice@example.com">alice@example.com</a></dd>"#
        ));
        assert!(actual.contains(&format!(
            r#"<dd class="avatar"><img src="{}" /></dd>"#,
            data_uri("image/png", PNG)
        )));
        assert!(actual.contains("<dd>Lunch &amp; Learn</dd>"));
        assert!(actual.contains("<dd>Tue, Jul 1, 2025 at 1:43 PM</dd>"));
        assert!(actual.contains(r#"<dt>Cc:</dt> <dd>Carol <a href="mailto:carol@example.com">"#));
        assert!(!actual.contains("<dt>Bcc:</dt>"));
    }

    /// Tests a missing avatar is left out of the header
    #[tokio::test]
    async fn it_omits_missing_avatars() {
        let fetcher = FakeFetcher::default().with(
            &avatar_url("alice@example.com"),
            404,
            "text/html",
            b"",
        );
        let assembler = DocumentAssembler::new(&fetcher).unwrap();
        let msg = message("m1", "No avatar");

        let blob = assembler
            .message_to_html(&[(&msg).into()], &RenderOptions::default())
            .await
            .unwrap();

        assert!(!html(&blob).contains("class=\"avatar\""));
    }

    /// Tests image attachments are embedded and others are listed by name
    #[tokio::test]
    async fn it_lists_attachments() {
        let fetcher = FakeFetcher::default();
        let assembler = DocumentAssembler::new(&fetcher).unwrap();
        let mut msg = message("m1", "Files");
        msg.attachments = vec![
            Attachment {
                name: "chart.png".to_string(),
                content_type: "image/png".to_string(),
                content: PNG.to_vec(),
            },
            Attachment {
                name: "report.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                content: b"%PDF-1.4".to_vec(),
            },
        ];

        let blob = assembler
            .message_to_html(&[(&msg).into()], &body_only())
            .await
            .unwrap();
        let actual = html(&blob);

        assert!(actual.contains("<strong>Attachments:</strong>"));
        assert!(actual.contains(&format!(
            r#"<img src="{}" alt="&lt;chart.png&gt;" />"#,
            data_uri("image/png", PNG)
        )));
        assert!(actual.contains("&lt;report.pdf&gt;<br />"));

        let opts = RenderOptions {
            include_attachments: false,
            ..body_only()
        };
        let blob = assembler
            .message_to_html(&[(&msg).into()], &opts)
            .await
            .unwrap();
        assert!(!html(&blob).contains("Attachments:"));
    }

    /// Tests the output name comes from the subject unless overridden
    #[tokio::test]
    async fn it_names_the_output() {
        let fetcher = FakeFetcher::default();
        let assembler = DocumentAssembler::new(&fetcher).unwrap();
        let msg = message("m1", "Re: Lunch?");

        let blob = assembler
            .message_to_html(&[(&msg).into()], &body_only())
            .await
            .unwrap();
        assert_eq!(blob.name, "Re Lunch.html");
        assert_eq!(blob.content_type, "text/html");

        let opts = RenderOptions {
            filename: Some("custom.html".to_string()),
            ..body_only()
        };
        let blob = assembler
            .message_to_html(&[(&msg).into()], &opts)
            .await
            .unwrap();
        assert_eq!(blob.name, "custom.html");

        let untitled = message("m2", "  ");
        let blob = assembler
            .message_to_html(&[(&untitled).into()], &body_only())
            .await
            .unwrap();
        assert_eq!(blob.name, "untitled.html");
    }

    /// Tests the PDF variant hands the HTML document to the renderer
    #[tokio::test]
    async fn it_renders_pdfs() {
        let fetcher = FakeFetcher::default();
        let renderer = FakeRenderer::default();
        let assembler = DocumentAssembler::new(&fetcher).unwrap();
        let msg = message("m1", "Invoice");

        let pdf = assembler
            .message_to_pdf(&renderer, &[(&msg).into()], &body_only())
            .await
            .unwrap();

        assert_eq!(pdf.name, "Invoice.pdf");
        assert_eq!(pdf.content_type, "application/pdf");
        assert!(pdf.bytes.starts_with(b"%PDF-"));

        let rendered = renderer.rendered();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].name, "Invoice.html");
        assert!(html(&rendered[0]).contains("<p>Invoice</p>"));
    }

    /// Tests anything but messages and threads is rejected
    #[tokio::test]
    async fn it_rejects_invalid_input() {
        let fetcher = FakeFetcher::default();
        let renderer = FakeRenderer::default();
        let assembler = DocumentAssembler::new(&fetcher).unwrap();
        let blob = Blob::html("page.html", "<p></p>".to_string());
        let empty = thread("t1", vec![]);

        let inputs: Vec<Vec<Renderable>> = vec![vec![], vec![(&blob).into()], vec![(&empty).into()]];
        for items in inputs {
            let err = assembler
                .message_to_html(&items, &RenderOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<Error>(),
                Some(Error::InvalidArgument(_))
            ));

            let err = assembler
                .message_to_pdf(&renderer, &items, &RenderOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<Error>(),
                Some(Error::InvalidArgument(_))
            ));
        }
        assert!(renderer.rendered().is_empty());
    }
}
