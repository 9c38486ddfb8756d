//! Response blueprints for the offline responder.

pub(super) fn react(name: &str) -> String {
    format!(
        r#"Here's a React component to get you started:

```jsx
import React, {{ useState }} from 'react';

function {name}() {{
  const [count, setCount] = useState(0);

  return (
    <div className="p-4 rounded-lg shadow">
      <h2 className="text-xl font-semibold">Hello from React!</h2>
      <p>You clicked {{count}} times.</p>
      <button onClick={{() => setCount(count + 1)}}>
        Click me
      </button>
    </div>
  );
}}

export default {name};
```

**Key points:**
- Functional component using the `useState` hook
- State updates trigger a re-render
- Export it and import it wherever you need it"#
    )
}

pub(super) const CSS: &str = r#"Here's a CSS layout that centers content with Flexbox:

```css
.container {
  display: flex;
  justify-content: center;
  align-items: center;
  min-height: 100vh;
  padding: 1rem;
}

.card {
  background: #ffffff;
  border-radius: 8px;
  box-shadow: 0 2px 8px rgba(0, 0, 0, 0.1);
  padding: 1.5rem;
  max-width: 400px;
}
```

**Key points:**
- `justify-content` centers on the main axis
- `align-items` centers on the cross axis
- `min-height: 100vh` fills the viewport"#;

pub(super) fn javascript(name: &str) -> String {
    format!(
        r#"Here's a JavaScript function you can adapt:

```javascript
const {name} = () => {{
  const items = [1, 2, 3, 4, 5];

  const doubled = items.map((item) => item * 2);
  console.log('Result:', doubled);

  return doubled;
}};

{name}();
```

**Key points:**
- Arrow function syntax with `const`
- `Array.prototype.map` returns a new array
- Call it directly or export it from a module"#
    )
}

pub(super) const HTML: &str = r##"Here's a starter HTML page:

```html
<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>My Page</title>
</head>
<body>
  <header>
    <h1>Welcome</h1>
    <nav>
      <a href="#about">About</a>
      <a href="#contact">Contact</a>
    </nav>
  </header>
  <main>
    <section id="about">
      <p>Start building your page here.</p>
    </section>
  </main>
</body>
</html>
```

**Key points:**
- Semantic elements (`header`, `nav`, `main`, `section`)
- The viewport meta tag makes the page responsive"##;

pub(super) const FALLBACK: &str = r#"Hi! I'm DevNest AI, your coding assistant.

I can help you with:
- **React**: "create a component for Login"
- **CSS**: "how do I center a div with css"
- **JavaScript**: "write a function for fetchData"
- **HTML**: "build me a landing page in html"

Ask me about any of these and I'll share a code example."#;
